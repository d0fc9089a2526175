//! Fixed catalogue of pattern-matching solvers for recognisable question
//! shapes. Every solver is total: a question it does not recognise yields
//! `None` and the catalogue moves on to the next one.

pub mod algebra;
pub mod basic;
pub mod expr;
pub mod polynomial;

use serde::Serialize;

use crate::validation::answer::AnswerValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    Arithmetic,
    LinearEquation,
    SquareArea,
    RectangleArea,
    SquarePerimeter,
    RectanglePerimeter,
    PercentageOf,
    FunctionEvaluation,
    SlopeCalculation,
    YInterceptCalculation,
    QuadraticFactoring,
    PolynomialDegree,
    RationalSimplification,
    CoefficientExtraction,
}

impl SolveMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMethod::Arithmetic => "arithmetic",
            SolveMethod::LinearEquation => "linear_equation",
            SolveMethod::SquareArea => "square_area",
            SolveMethod::RectangleArea => "rectangle_area",
            SolveMethod::SquarePerimeter => "square_perimeter",
            SolveMethod::RectanglePerimeter => "rectangle_perimeter",
            SolveMethod::PercentageOf => "percentage_of",
            SolveMethod::FunctionEvaluation => "function_evaluation",
            SolveMethod::SlopeCalculation => "slope_calculation",
            SolveMethod::YInterceptCalculation => "y_intercept_calculation",
            SolveMethod::QuadraticFactoring => "quadratic_factoring",
            SolveMethod::PolynomialDegree => "polynomial_degree",
            SolveMethod::RationalSimplification => "rational_simplification",
            SolveMethod::CoefficientExtraction => "coefficient_extraction",
        }
    }
}

/// An independently derived answer plus the derivation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub answer: AnswerValue,
    pub method: SolveMethod,
    pub work: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Arithmetic,
    LinearEquation,
    Geometry,
    Percentage,
    FunctionEvaluation,
    SlopeIntercept,
    QuadraticRoots,
    PolynomialDegree,
    RationalSimplification,
    CoefficientExtraction,
}

/// Priority order. Earlier entries win when several could claim a question.
pub const CATALOGUE: [SolverKind; 10] = [
    SolverKind::Arithmetic,
    SolverKind::LinearEquation,
    SolverKind::Geometry,
    SolverKind::Percentage,
    SolverKind::FunctionEvaluation,
    SolverKind::SlopeIntercept,
    SolverKind::QuadraticRoots,
    SolverKind::PolynomialDegree,
    SolverKind::RationalSimplification,
    SolverKind::CoefficientExtraction,
];

impl SolverKind {
    /// `text` is the lowercased, symbol-normalised question.
    pub fn solve(&self, text: &str) -> Option<Solution> {
        match self {
            SolverKind::Arithmetic => basic::arithmetic(text),
            SolverKind::LinearEquation => basic::linear_equation(text),
            SolverKind::Geometry => basic::geometry(text),
            SolverKind::Percentage => basic::percentage(text),
            SolverKind::FunctionEvaluation => algebra::function_evaluation(text),
            SolverKind::SlopeIntercept => algebra::slope_intercept(text),
            SolverKind::QuadraticRoots => algebra::quadratic_roots(text),
            SolverKind::PolynomialDegree => algebra::polynomial_degree(text),
            SolverKind::RationalSimplification => algebra::rational_simplification(text),
            SolverKind::CoefficientExtraction => algebra::coefficient_extraction(text),
        }
    }
}

/// First solver in catalogue order that recognises the question.
pub fn solve(text: &str) -> Option<Solution> {
    CATALOGUE.iter().find_map(|kind| {
        let solution = kind.solve(text)?;
        tracing::debug!(solver = ?kind, method = solution.method.as_str(), "Question solved");
        Some(solution)
    })
}

pub fn round4(value: f64) -> f64 {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rounds to four decimals and drops a trailing `.0`.
pub fn format_number(value: f64) -> String {
    let rounded = round4(value);
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_compactly() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-0.00001), "0");
        assert_eq!(format_number(2.0 / 3.0), "0.6667");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn arithmetic_wins_over_later_solvers() {
        let solution = solve("what is 2 + 2 * 3?").unwrap();
        assert_eq!(solution.method, SolveMethod::Arithmetic);
        assert_eq!(solution.answer, AnswerValue::Scalar(8.0));
    }

    #[test]
    fn unrecognised_text_is_unsolved() {
        assert!(solve("which theorem relates the sides of a right triangle?").is_none());
    }
}
