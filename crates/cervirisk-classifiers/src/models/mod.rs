pub mod classifier_trait;
pub mod decision_tree;
pub mod random_forest;

pub use classifier_trait::ClassifierModel;
pub use random_forest::RandomForest;
