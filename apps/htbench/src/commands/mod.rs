pub mod analyse;
pub mod run;
