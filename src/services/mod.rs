pub mod question_provider;
