pub mod generate_mirrors;
