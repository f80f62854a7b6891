pub mod check;
pub mod lookup;
pub mod run;
