pub mod math_class;
pub mod question;
pub mod quiz;
