use once_cell::sync::Lazy;
use regex::Regex;

use super::{expr, format_number, round4, SolveMethod, Solution};
use crate::validation::answer::AnswerValue;

static ARITHMETIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"what\s+is\s+([\d+\-*/^()\s.]+)\s*\?",
        r"calculate\s+([\d+\-*/^()\s.]+)",
        r"evaluate\s+([\d+\-*/^()\s.]+)",
        r"find\s+the\s+value\s+of\s+([\d+\-*/^()\s.]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static LINEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:solve\s+for|find(?:\s+the\s+value\s+of)?)\s+([x-z])\b.*?(-?\d*(?:\.\d+)?)\s*\*?\s*([x-z])\s*(?:([+-])\s*(\d+(?:\.\d+)?))?\s*=\s*(-?\d+(?:\.\d+)?)",
    )
    .unwrap()
});

static PERCENT_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"what\s+is\s+(\d+(?:\.\d+)?)\s*%\s+of\s+(\d+(?:\.\d+)?)").unwrap()
});

static SIDE_LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:sides?|length|width)(?:\s+(?:length|of|is|measures|measuring|equal\s+to))*\s*[:=]?\s*(\d+(?:\.\d+)?)",
    )
    .unwrap()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static UNIT_EXPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^\s*\d+").unwrap());
static NON_SHAPE_SQUARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"square\s+(?:root|roots|feet|foot|units?|meters?|metres?|inches|inch|centimeters?|cm|mm|miles?|yards?|kilometers?|km|m)\b",
    )
    .unwrap()
});

/// "what is / calculate / evaluate <numeric expression>".
pub fn arithmetic(text: &str) -> Option<Solution> {
    for pattern in ARITHMETIC.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let Some(span) = caps.get(1) else {
            continue;
        };
        // "calculate 20% of 50" or "evaluate 2x" only look numeric up to here
        let raw = span.as_str();
        let next = text[span.end()..].chars().next();
        if !raw.ends_with(char::is_whitespace)
            && next.map_or(false, |c| c.is_alphanumeric() || c == '%' || c == '=')
        {
            continue;
        }

        let expression: String = raw
            .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if !expression.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(value) = expr::evaluate(&expression) else {
            continue;
        };
        return Some(Solution {
            answer: AnswerValue::Scalar(round4(value)),
            method: SolveMethod::Arithmetic,
            work: format!("{} = {}", expression, format_number(value)),
        });
    }
    None
}

/// "solve for x: 2x + 4 = 10" and "find x if 3x - 2 = 7".
pub fn linear_equation(text: &str) -> Option<Solution> {
    if text.contains('^') || text.contains('²') {
        return None;
    }
    let caps = LINEAR.captures(text)?;
    let var = caps.get(1)?.as_str();
    if caps.get(3)?.as_str() != var {
        return None;
    }

    let coeff_match = caps.get(2)?;
    let before = text[..coeff_match.start()].trim_end().chars().last();
    if before.map_or(false, |c| c.is_ascii_digit() || "+-*/^()=".contains(c)) {
        return None;
    }
    let rhs_match = caps.get(6)?;
    // "= 10 - x" has more equation after the number
    let tail = text[rhs_match.end()..].trim_start();
    if !(tail.is_empty() || tail.starts_with(['?', '.', ',', ';'])) {
        return None;
    }

    let coefficient = match coeff_match.as_str() {
        "" => 1.0,
        "-" => -1.0,
        other => other.parse::<f64>().ok()?,
    };
    if coefficient == 0.0 {
        return None;
    }
    let constant = match (caps.get(4), caps.get(5)) {
        (Some(op), Some(n)) => {
            let n: f64 = n.as_str().parse().ok()?;
            if op.as_str() == "-" {
                -n
            } else {
                n
            }
        }
        _ => 0.0,
    };
    let rhs: f64 = rhs_match.as_str().parse().ok()?;

    let isolated = rhs - constant;
    let answer = isolated / coefficient;
    let lhs = if constant == 0.0 {
        format!("{}{}", format_number(coefficient), var)
    } else {
        format!(
            "{}{} {} {}",
            format_number(coefficient),
            var,
            if constant < 0.0 { '-' } else { '+' },
            format_number(constant.abs())
        )
    };
    Some(Solution {
        answer: AnswerValue::Scalar(round4(answer)),
        method: SolveMethod::LinearEquation,
        work: format!(
            "{} = {} → {}{} = {} → {} = {}",
            lhs,
            format_number(rhs),
            format_number(coefficient),
            var,
            format_number(isolated),
            var,
            format_number(answer)
        ),
    })
}

/// Square and rectangle area/perimeter. Rectangles are checked first and
/// "square root" or "square feet" never count as a square.
pub fn geometry(text: &str) -> Option<Solution> {
    let without_units = UNIT_EXPONENT.replace_all(text, "");
    let numbers: Vec<f64> = NUMBER
        .find_iter(&without_units)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let wants_area = text.contains("area");
    let wants_perimeter = text.contains("perimeter");
    // exactly one of the two measures is asked for
    if wants_area == wants_perimeter || text.contains("diagonal") {
        return None;
    }

    if text.contains("rectangle") && numbers.len() >= 2 {
        let (l, w) = (numbers[0], numbers[1]);
        if wants_area {
            return Some(Solution {
                answer: AnswerValue::Scalar(round4(l * w)),
                method: SolveMethod::RectangleArea,
                work: format!("{} × {} = {}", format_number(l), format_number(w), format_number(l * w)),
            });
        }
        if wants_perimeter {
            let p = 2.0 * (l + w);
            return Some(Solution {
                answer: AnswerValue::Scalar(round4(p)),
                method: SolveMethod::RectanglePerimeter,
                work: format!("2 × ({} + {}) = {}", format_number(l), format_number(w), format_number(p)),
            });
        }
        return None;
    }

    let is_square = NON_SHAPE_SQUARE.replace_all(text, "").contains("square");
    if !is_square || text.contains("rectangle") {
        return None;
    }
    let side: f64 = SIDE_LENGTH.captures(&without_units)?.get(1)?.as_str().parse().ok()?;
    if wants_area {
        return Some(Solution {
            answer: AnswerValue::Scalar(round4(side * side)),
            method: SolveMethod::SquareArea,
            work: format!("{}² = {}", format_number(side), format_number(side * side)),
        });
    }
    if wants_perimeter {
        return Some(Solution {
            answer: AnswerValue::Scalar(round4(4.0 * side)),
            method: SolveMethod::SquarePerimeter,
            work: format!("4 × {} = {}", format_number(side), format_number(4.0 * side)),
        });
    }
    None
}

/// "what is N% of M".
pub fn percentage(text: &str) -> Option<Solution> {
    let caps = PERCENT_OF.captures(text)?;
    let pct: f64 = caps.get(1)?.as_str().parse().ok()?;
    let of: f64 = caps.get(2)?.as_str().parse().ok()?;
    let result = pct / 100.0 * of;
    Some(Solution {
        answer: AnswerValue::Scalar(round4(result)),
        method: SolveMethod::PercentageOf,
        work: format!("{}% of {} = {}", format_number(pct), format_number(of), format_number(result)),
    })
}
