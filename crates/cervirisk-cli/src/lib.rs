//! cervirisk-cli: the `cervirisk` trainer, prediction server and artifact
//! smoke test, built on `cervirisk-classifiers`.
pub mod check;
pub mod serving;
pub mod training;
pub mod util;
