use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

use crate::models::math_class::MathClass;
use crate::models::quiz::Difficulty;

/// Builds the system and user prompts for one generation attempt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    classes: Vec<MathClass>,
    difficulty: Difficulty,
}

impl PromptBuilder {
    pub fn new(classes: Vec<MathClass>, difficulty: Difficulty) -> Self {
        Self {
            classes,
            difficulty,
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            r#"You are an experienced SAT math teacher writing multiple-choice practice questions at the {difficulty} level.

Every calculation must be correct and the marked correct answer must be mathematically accurate.
Each question must test a different skill; never repeat a question type, method or set of numbers.

OUTPUT RULES:
- Respond with the JSON object only. No prose before or after it, no markdown fences.
- Start with {{ and end with }}.
- Escape every double quote inside a string as \" and write newlines inside strings as \n.
- No trailing commas. Every string must be terminated.
- Write math as plain text ("x^2", "3/4", "log base 2").

EXPLANATION RULES:
- Two or three sentences with the clean solution steps only.
- Never show second attempts or self-correction such as "Wait, let me recalculate".
- End by stating the final answer."#,
            difficulty = self.difficulty
        )
    }

    pub fn user_prompt(&self, count: usize) -> String {
        let mut rng = rand::thread_rng();
        let seed: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(13)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();

        let mut topics: Vec<String> = self
            .classes
            .iter()
            .flat_map(|c| c.topics().iter().map(move |t| format!("{}: {}", c.name(), t)))
            .collect();
        topics.shuffle(&mut rng);
        topics.truncate(count);

        let class_names: Vec<&str> = self.classes.iter().map(|c| c.name()).collect();
        let mut prompt = format!(
            "Generate a {} SAT math quiz with exactly {} questions for students who have taken: {}.\n\n",
            self.difficulty,
            count,
            class_names.join(", ")
        );

        prompt.push_str(&format!("{} LEVEL EXPECTATIONS:\n", self.difficulty.as_str().to_uppercase()));
        for class in &self.classes {
            prompt.push_str(&format!("{} ({}):\n", class.name(), self.difficulty));
            for line in class.guidelines(self.difficulty) {
                prompt.push_str(&format!("- {}\n", line));
            }
        }
        prompt.push('\n');
        prompt.push_str(general_guidelines(self.difficulty));

        prompt.push_str("\nQUESTION TOPICS:\n");
        for (i, topic) in topics.iter().enumerate() {
            prompt.push_str(&format!(
                "- Question {}: a {} question about {}\n",
                i + 1,
                self.difficulty,
                topic
            ));
        }

        prompt.push_str("\nDISTRIBUTION:\n");
        prompt.push_str(&self.distribution(count));

        prompt.push_str(&format!(
            "\n\nReturn JSON in exactly this shape:\n{}\n",
            schema_example(&class_names, self.difficulty)
        ));
        prompt.push_str(&format!(
            "\nGeneration ID: {}. This is a fresh quiz: vary every number, context and method.",
            seed
        ));
        prompt
    }

    /// Even split of `count` questions across the selected classes; earlier
    /// classes take the remainder.
    pub fn distribution(&self, count: usize) -> String {
        if self.classes.is_empty() {
            return String::new();
        }
        let per_class = count / self.classes.len();
        let remainder = count % self.classes.len();
        self.classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let n = per_class + usize::from(i < remainder);
                format!(
                    "- Generate {} question{} from {}",
                    n,
                    if n == 1 { "" } else { "s" },
                    class.name()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn general_guidelines(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "GENERAL: solvable in under a minute, one or two steps, simple integers, direct use of a basic formula.\n"
        }
        Difficulty::Medium => {
            "GENERAL: about a minute to solve, two to four steps, moderate fractions or decimals, connects concepts.\n"
        }
        Difficulty::Hard => {
            "GENERAL: ninety seconds or more, several steps with decision points, combines multiple concepts.\n"
        }
    }
}

fn schema_example(classes: &[&str], difficulty: Difficulty) -> String {
    let example = json!({
        "quiz": {
            "selectedClasses": classes,
            "difficulty": difficulty.as_str(),
            "questions": [
                {
                    "id": 1,
                    "question": "Question text",
                    "options": {"A": "...", "B": "...", "C": "...", "D": "..."},
                    "correctAnswer": "B",
                    "explanation": "Short solution ending with the answer.",
                    "topic": "Topic name",
                    "mathClass": classes.first().copied().unwrap_or("Algebra I")
                }
            ]
        }
    });
    serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string())
}
