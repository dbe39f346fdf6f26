// Scoring: turns timeline and classifier output into a bounded risk score.

pub mod risk;
