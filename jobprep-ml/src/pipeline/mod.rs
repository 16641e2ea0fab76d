//! Stage orchestration: the validation gate, the feature transformer and the
//! stage driver.

pub mod gate;
pub mod stages;
pub mod transformer;

pub use gate::{GateStatus, check_gate};
pub use stages::{
    DataTransformationStage, DataValidationStage, ModelEvaluationStage, ModelTrainerStage, Stage,
    all_stages, run_pipeline,
};
pub use transformer::{FeatureTransformer, TransformStage};
