pub mod amortize;
pub mod analyze;
pub mod negotiate;
pub mod portfolio;
pub mod score;
pub mod sensitivity;
pub mod stress;
