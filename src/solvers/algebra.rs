use once_cell::sync::Lazy;
use regex::Regex;

use super::polynomial::Polynomial;
use super::{expr, format_number, round4, SolveMethod, Solution};
use crate::validation::answer::AnswerValue;

static FUNCTION_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^a-z])([a-z])\(([a-z])\)\s*=\s*([0-9a-z+\-*/^().\s]+)").unwrap()
});

static STANDARD_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([+-]?\d*(?:\.\d+)?)\s*x\s*([+-]\s*\d*(?:\.\d+)?)\s*y\s*=\s*([+-]?\s*\d+(?:\.\d+)?)",
    )
    .unwrap()
});

static SLOPE_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^a-z])y\s*=\s*([+-]?\s*\d*(?:\.\d+)?)\s*x\b\s*(?:([+-])\s*(\d+(?:\.\d+)?))?",
    )
    .unwrap()
});

static QUADRATIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([+-]?\d*)\s*x\s*\^\s*2\s*(?:([+-])\s*(\d*)\s*x\b)?\s*(?:([+-])\s*(\d+))?\s*=\s*0\b",
    )
    .unwrap()
});

static RATIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]+)\)\s*/\s*\(([^()]+)\)").unwrap());

static COEFFICIENT_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"coefficient.*?\bx\b\s*(?:\^\s*(\d+))?").unwrap());

const MAX_ROOT_SEARCH: i64 = 10_000;

/// `f(x) = <expression in x>` followed by a call such as `f(3)`. Any
/// single-letter function and variable name is accepted.
pub fn function_evaluation(text: &str) -> Option<Solution> {
    let caps = FUNCTION_DEF.captures(text)?;
    let name = caps.get(1)?.as_str();
    let var = caps.get(2)?.as_str().chars().next()?;
    let body = caps.get(3)?;
    let expression = leading_formula(body.as_str());
    if expression.is_empty() {
        return None;
    }

    let call = Regex::new(&format!(
        r"(?:^|[^a-z]){}\((-?\d+(?:\.\d+)?)\)",
        regex::escape(name)
    ))
    .ok()?;
    let arg_text = call.captures(&text[body.start()..])?.get(1)?.as_str();
    let arg: f64 = arg_text.parse().ok()?;

    let value = expr::evaluate_with(&expression, var, arg).ok()?;
    let substituted = expression.replace(var, &format!("({})", arg_text));
    Some(Solution {
        answer: AnswerValue::Scalar(round4(value)),
        method: SolveMethod::FunctionEvaluation,
        work: format!(
            "{}({}) = {} = {}",
            name,
            arg_text,
            substituted,
            format_number(value)
        ),
    })
}

/// Cuts a captured function body at the first English word and trailing
/// punctuation: `2x + 3. what is f(4)` becomes `2x + 3`.
fn leading_formula(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut end = chars.len();
    for i in 0..chars.len().saturating_sub(1) {
        if chars[i].is_ascii_alphabetic() && chars[i + 1].is_ascii_alphabetic() {
            end = i;
            break;
        }
    }
    let head: String = chars[..end].iter().collect();
    head.trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '+' | '-' | '*' | '/' | '^') || c.is_whitespace())
        .to_string()
}

/// Slope or y-intercept of a line given as `ax + by = c` or `y = mx + b`.
pub fn slope_intercept(text: &str) -> Option<Solution> {
    let wording = text.replace("slope-intercept", "");
    let slope_at = wording.find("slope");
    let intercept_at = wording.find("intercept");
    let wants_slope = match (slope_at, intercept_at) {
        (Some(s), Some(i)) => s < i,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => return None,
    };

    let (slope, intercept, equation) = if let Some(caps) = STANDARD_FORM.captures(text) {
        let a = signed_coefficient(caps.get(1)?.as_str())?;
        let b = signed_coefficient(caps.get(2)?.as_str())?;
        let c: f64 = compact(caps.get(3)?.as_str()).parse().ok()?;
        if b == 0.0 {
            return None;
        }
        (-a / b, c / b, caps.get(0)?.as_str().trim().to_string())
    } else {
        let caps = SLOPE_FORM.captures(text)?;
        let m = signed_coefficient(caps.get(1)?.as_str())?;
        let b = match (caps.get(2), caps.get(3)) {
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
        let matched = caps.get(0)?.as_str();
        let equation = matched.trim_start_matches(|c: char| c != 'y').trim().to_string();
        (m, b, equation)
    };

    let rearranged = format!(
        "{} → y = {}x {} {}",
        equation,
        format_number(slope),
        if intercept < 0.0 { '-' } else { '+' },
        format_number(intercept.abs())
    );
    if wants_slope {
        Some(Solution {
            answer: AnswerValue::Scalar(round4(slope)),
            method: SolveMethod::SlopeCalculation,
            work: format!("{} → slope = {}", rearranged, format_number(slope)),
        })
    } else {
        Some(Solution {
            answer: AnswerValue::Scalar(round4(intercept)),
            method: SolveMethod::YInterceptCalculation,
            work: format!("{} → y-intercept = {}", rearranged, format_number(intercept)),
        })
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `""` and `"+"` mean 1, `"-"` means -1.
fn signed_coefficient(raw: &str) -> Option<f64> {
    match compact(raw).as_str() {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        other => other.parse().ok(),
    }
}

/// Integer roots of `ax^2 + bx + c = 0` by sum/product matching once the
/// leading coefficient is normalised to 1.
pub fn quadratic_roots(text: &str) -> Option<Solution> {
    if !["root", "zero", "solution"].iter().any(|w| text.contains(w)) {
        return None;
    }
    let caps = QUADRATIC.captures(text)?;
    let a = signed_coefficient(caps.get(1)?.as_str())? as i64;
    let mut b = match (caps.get(2), caps.get(3)) {
        (Some(op), Some(n)) => {
            let n = if n.as_str().is_empty() { 1 } else { n.as_str().parse::<i64>().ok()? };
            if op.as_str() == "-" {
                -n
            } else {
                n
            }
        }
        _ => 0,
    };
    let mut c = match (caps.get(4), caps.get(5)) {
        (Some(op), Some(n)) => {
            let n = n.as_str().parse::<i64>().ok()?;
            if op.as_str() == "-" {
                -n
            } else {
                n
            }
        }
        _ => 0,
    };

    if a == 0 {
        return None;
    }
    if a != 1 {
        if b % a != 0 || c % a != 0 {
            return None;
        }
        b /= a;
        c /= a;
    }

    let (r1, r2) = if c == 0 {
        (0, -b)
    } else {
        integer_roots(-b, c)?
    };
    let (low, high) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
    Some(Solution {
        answer: AnswerValue::RootSet(vec![low as f64, high as f64]),
        method: SolveMethod::QuadraticFactoring,
        work: format!("Factoring gives {}{} = 0", factor(low), factor(high)),
    })
}

fn integer_roots(sum: i64, product: i64) -> Option<(i64, i64)> {
    let limit = product.abs().min(MAX_ROOT_SEARCH);
    for i in 1..=limit {
        if product % i != 0 {
            continue;
        }
        let j = product / i;
        for (r1, r2) in [(i, j), (-i, -j), (i, -j), (-i, j)] {
            if r1 + r2 == sum && r1 * r2 == product {
                return Some((r1, r2));
            }
        }
    }
    None
}

fn factor(root: i64) -> String {
    match root {
        0 => "(x)".to_string(),
        r if r > 0 => format!("(x - {})", r),
        r => format!("(x + {})", -r),
    }
}

/// Highest power of `x` in the polynomial the question talks about.
pub fn polynomial_degree(text: &str) -> Option<Solution> {
    if !text.contains("degree") || text.contains(")(") {
        return None;
    }
    let degree = Polynomial::find_in(text)
        .iter()
        .map(Polynomial::degree)
        .max()
        .filter(|d| *d >= 1)?;
    Some(Solution {
        answer: AnswerValue::Scalar(degree as f64),
        method: SolveMethod::PolynomialDegree,
        work: format!("Highest power of x is {}", degree),
    })
}

/// `(p(x)) / (q(x))` simplified by exact polynomial division. Only succeeds
/// when `q` divides `p` with no remainder.
pub fn rational_simplification(text: &str) -> Option<Solution> {
    if !text.contains("simplif") && !text.contains("rational") {
        return None;
    }
    let caps = RATIONAL.captures(text)?;
    let numerator = Polynomial::parse(caps.get(1)?.as_str())?;
    let denominator = Polynomial::parse(caps.get(2)?.as_str())?;
    if denominator.degree() < 1 {
        return None;
    }
    let (quotient, remainder) = numerator.div(&denominator)?;
    if !remainder.is_zero() {
        return None;
    }

    let answer = if quotient.degree() == 0 {
        AnswerValue::Scalar(round4(quotient.coeff(0)))
    } else {
        AnswerValue::Expression(quotient.to_string())
    };
    Some(Solution {
        answer,
        method: SolveMethod::RationalSimplification,
        work: format!(
            "({}) / ({}) = {} since ({})({}) = {}",
            numerator.pretty(),
            denominator.pretty(),
            quotient.pretty(),
            quotient.pretty(),
            denominator.pretty(),
            numerator.pretty()
        ),
    })
}

/// Coefficient attached to the requested power of `x`.
pub fn coefficient_extraction(text: &str) -> Option<Solution> {
    if !text.contains("coefficient") {
        return None;
    }
    let caps = COEFFICIENT_TARGET.captures(text)?;
    let power: usize = match caps.get(1) {
        Some(p) => p.as_str().parse().ok()?,
        None => 1,
    };

    let is_bare_target =
        |p: &Polynomial| p.term_count() == 1 && p.degree() == power && p.coeff(power) == 1.0;
    let candidates: Vec<Polynomial> = Polynomial::find_in(text)
        .into_iter()
        .filter(|p| !is_bare_target(p))
        .collect();
    let mut best: Option<&Polynomial> = None;
    for candidate in &candidates {
        if best.map_or(true, |b| candidate.term_count() > b.term_count()) {
            best = Some(candidate);
        }
    }
    let poly = best?;
    let coeff = poly.coeff(power);
    Some(Solution {
        answer: AnswerValue::Scalar(round4(coeff)),
        method: SolveMethod::CoefficientExtraction,
        work: format!(
            "In {}, the coefficient of x^{} is {}",
            poly.pretty(),
            power,
            format_number(coeff)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_any_function_name() {
        let s = function_evaluation("if f(x) = 2x^2 - 3x + 1, what is f(3)?").unwrap();
        assert_eq!(s.answer, AnswerValue::Scalar(10.0));
        assert_eq!(s.work, "f(3) = 2(3)^2 - 3(3) + 1 = 10");

        let g = function_evaluation("let g(t) = 4t - 7. find g(2).").unwrap();
        assert_eq!(g.answer, AnswerValue::Scalar(1.0));
    }

    #[test]
    fn function_without_call_is_unsolved() {
        assert!(function_evaluation("if f(x) = 3x + 1, what is the slope?").is_none());
    }

    #[test]
    fn slope_and_intercept_from_standard_form() {
        let s = slope_intercept("what is the slope of the line with equation 2x + 3y = 6?").unwrap();
        assert_eq!(s.method, SolveMethod::SlopeCalculation);
        assert_eq!(s.answer, AnswerValue::Scalar(-0.6667));

        let i = slope_intercept("find the y-intercept of the line 2x + 3y = 6").unwrap();
        assert_eq!(i.method, SolveMethod::YInterceptCalculation);
        assert_eq!(i.answer, AnswerValue::Scalar(2.0));
    }

    #[test]
    fn slope_intercept_form_is_read_directly() {
        let s = slope_intercept("what is the slope of the line y = -3x + 4?").unwrap();
        assert_eq!(s.answer, AnswerValue::Scalar(-3.0));
        let i = slope_intercept("written in slope-intercept form y = 2x - 5, what is the y-intercept?")
            .unwrap();
        assert_eq!(i.answer, AnswerValue::Scalar(-5.0));
    }

    #[test]
    fn quadratic_roots_by_sum_and_product() {
        let s = quadratic_roots("what are the roots of x^2 - 5x + 6 = 0?").unwrap();
        assert_eq!(s.answer, AnswerValue::RootSet(vec![2.0, 3.0]));
        assert_eq!(s.work, "Factoring gives (x - 2)(x - 3) = 0");

        let scaled = quadratic_roots("find the roots of 2x^2 + 2x - 12 = 0").unwrap();
        assert_eq!(scaled.answer, AnswerValue::RootSet(vec![-3.0, 2.0]));

        let zero_c = quadratic_roots("what are the roots of x^2 - 4x = 0?").unwrap();
        assert_eq!(zero_c.answer, AnswerValue::RootSet(vec![0.0, 4.0]));

        let double = quadratic_roots("what are the roots of x^2 - 6x + 9 = 0?").unwrap();
        assert_eq!(double.answer, AnswerValue::RootSet(vec![3.0, 3.0]));
    }

    #[test]
    fn quadratic_without_integer_roots_is_unsolved() {
        assert!(quadratic_roots("what are the roots of x^2 + x + 1 = 0?").is_none());
        assert!(quadratic_roots("what are the roots of 3x^2 + 2x + 1 = 0?").is_none());
    }

    #[test]
    fn polynomial_degree_is_max_exponent() {
        let s = polynomial_degree("what is the degree of the polynomial 3x^4 - 2x^2 + 7?").unwrap();
        assert_eq!(s.answer, AnswerValue::Scalar(4.0));
        assert!(polynomial_degree("what is the degree of (x^2 + 1)(x^3 - 2)?").is_none());
    }

    #[test]
    fn rational_expression_divides_exactly() {
        let s = rational_simplification("simplify the rational expression (2x^2 - 5x - 3)/(x - 3)")
            .unwrap();
        assert_eq!(s.answer, AnswerValue::Expression("2x+1".into()));

        let t = rational_simplification("simplify (x^2 - 9) / (x + 3)").unwrap();
        assert_eq!(t.answer, AnswerValue::Expression("x-3".into()));

        assert!(rational_simplification("simplify (x^2 + 1) / (x - 1)").is_none());
    }

    #[test]
    fn coefficient_of_requested_power() {
        let s = coefficient_extraction("what is the coefficient of x^2 in 3x^2 + 5x - 2?").unwrap();
        assert_eq!(s.answer, AnswerValue::Scalar(3.0));

        let lin = coefficient_extraction("in 4x^3 - 7x + 1, what is the coefficient of x?").unwrap();
        assert_eq!(lin.answer, AnswerValue::Scalar(-7.0));

        let missing = coefficient_extraction("what is the coefficient of x^2 in x^3 + 1?").unwrap();
        assert_eq!(missing.answer, AnswerValue::Scalar(0.0));
    }
}
