//! Feature engineering: date/time parts, categorical codes and skill one-hot
//! columns, plus the persisted encoders that make them reproducible.

pub mod categorical;
pub mod datetime;
pub mod encoders;
pub mod skills;

pub use categorical::CategoricalEncoder;
pub use encoders::FittedEncoders;
pub use skills::{SkillVocabulary, normalize_skill, normalize_skill_list};
