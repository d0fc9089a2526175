use std::fmt;

use super::format_number;

const EPSILON: f64 = 1e-9;

/// Highest exponent accepted from text.
pub const MAX_POWER: usize = 64;

/// Single-variable polynomial in `x`; `coeffs[i]` multiplies `x^i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn from_coeffs(mut coeffs: Vec<f64>) -> Self {
        while coeffs.len() > 1 && coeffs.last().map_or(false, |c| c.abs() < EPSILON) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            coeffs.push(0.0);
        }
        Self { coeffs }
    }

    /// Parses sums of terms such as `2x^2 - 5x - 3`, `x²+1` or `(x - 3)`.
    /// Products of brackets and any other variable are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '*')
            .map(|c| if c == '−' { '-' } else { c })
            .collect();
        let compact = compact.replace('²', "^2").replace('³', "^3");
        let body = strip_wrapping_parens(&compact);
        if body.is_empty() || body.contains(['(', ')']) {
            return None;
        }

        let mut coeffs: Vec<f64> = Vec::new();
        for term in split_terms(body)? {
            let (power, coeff) = parse_term(&term)?;
            if coeffs.len() <= power {
                coeffs.resize(power.checked_add(1)?, 0.0);
            }
            coeffs[power] += coeff;
        }
        Some(Self::from_coeffs(coeffs))
    }

    /// Every polynomial-looking span of free text, in order of appearance.
    /// A span must mention `x` as a standalone letter.
    pub fn find_in(text: &str) -> Vec<Polynomial> {
        let chars: Vec<char> = text.chars().collect();
        let allowed = |i: usize| -> bool {
            let c = chars[i];
            if c == 'x' {
                let before = i.checked_sub(1).map(|j| chars[j]);
                let after = chars.get(i + 1).copied();
                return !before.map_or(false, char::is_alphabetic)
                    && !after.map_or(false, char::is_alphabetic);
            }
            c.is_ascii_digit() || matches!(c, '+' | '-' | '−' | '*' | '^' | '.' | '²' | '³' | ' ')
        };

        let mut found = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if !allowed(i) {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() && allowed(i) {
                i += 1;
            }
            let span: String = chars[start..i].iter().collect();
            let span = span.trim().trim_end_matches(['.', '+', '-', '*', '^']).trim();
            if span.contains('x') {
                if let Some(poly) = Polynomial::parse(span) {
                    found.push(poly);
                }
            }
        }
        found
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeff(&self, power: usize) -> f64 {
        self.coeffs.get(power).copied().unwrap_or(0.0)
    }

    pub fn term_count(&self) -> usize {
        self.coeffs.iter().filter(|c| c.abs() >= EPSILON).count()
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.abs() < EPSILON)
    }

    /// Long division. Returns `(quotient, remainder)`, or `None` when the
    /// divisor is zero.
    pub fn div(&self, divisor: &Polynomial) -> Option<(Polynomial, Polynomial)> {
        if divisor.is_zero() {
            return None;
        }
        let d = divisor.degree();
        let lead = divisor.coeff(d);
        let mut rem = self.coeffs.clone();
        if rem.len() <= d {
            return Some((Polynomial::from_coeffs(vec![0.0]), self.clone()));
        }

        let mut quot = vec![0.0; rem.len() - d];
        for k in (0..quot.len()).rev() {
            let factor = rem[k + d] / lead;
            quot[k] = factor;
            for (j, c) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= factor * c;
            }
        }
        rem.truncate(d.max(1));
        Some((Polynomial::from_coeffs(quot), Polynomial::from_coeffs(rem)))
    }

    /// Human-facing form with spaces around the operators, e.g. `2x + 1`.
    pub fn pretty(&self) -> String {
        let compact = self.to_string();
        let mut out = String::new();
        for (i, c) in compact.char_indices() {
            if i > 0 && (c == '+' || c == '-') && !compact[..i].ends_with('^') {
                out.push(' ');
                out.push(c);
                out.push(' ');
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Canonical compact form, highest power first: `2x^2-5x-3`.
impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut first = true;
        for power in (0..self.coeffs.len()).rev() {
            let c = self.coeffs[power];
            if c.abs() < EPSILON {
                continue;
            }
            if c < 0.0 {
                f.write_str("-")?;
            } else if !first {
                f.write_str("+")?;
            }
            let magnitude = c.abs();
            if power == 0 || (magnitude - 1.0).abs() > EPSILON {
                f.write_str(&format_number(magnitude))?;
            }
            match power {
                0 => {}
                1 => f.write_str("x")?,
                p => write!(f, "x^{}", p)?,
            }
            first = false;
        }
        Ok(())
    }
}

fn strip_wrapping_parens(text: &str) -> &str {
    let inner = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => inner,
        None => return text,
    };
    if inner.contains(['(', ')']) {
        text
    } else {
        inner
    }
}

fn split_terms(body: &str) -> Option<Vec<String>> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    for c in body.chars() {
        if (c == '+' || c == '-') && prev.is_some() && prev != Some('^') {
            if matches!(prev, Some('+' | '-')) {
                return None;
            }
            terms.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev = Some(c);
    }
    terms.push(current);
    Some(terms)
}

fn parse_term(term: &str) -> Option<(usize, f64)> {
    let (sign, rest) = match term.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, term.strip_prefix('+').unwrap_or(term)),
    };
    if rest.is_empty() {
        return None;
    }

    let Some(x_at) = rest.find('x') else {
        let value: f64 = rest.parse().ok()?;
        return Some((0, sign * value));
    };

    let coeff_text = &rest[..x_at];
    let coeff = if coeff_text.is_empty() {
        1.0
    } else {
        coeff_text.parse::<f64>().ok()?
    };

    let after = &rest[x_at + 1..];
    let power = if after.is_empty() {
        1
    } else {
        after.strip_prefix('^')?.parse::<usize>().ok()?
    };
    if power > MAX_POWER {
        return None;
    }
    Some((power, sign * coeff))
}
