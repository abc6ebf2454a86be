pub mod seeder;

pub use seeder::{demo_semesters, seed_semesters};
