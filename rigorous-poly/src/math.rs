pub mod ball;
pub mod dyadic;
pub mod other;
pub mod polynomial;

mod division;
mod multiplication;
mod series;
