//! Training loop and run summaries.

mod summary;
mod trainer;

pub use summary::{new_log_dir, read_events, ScalarEvent, SummaryWriter, CONFIG_FILE, EVENTS_FILE};
pub use trainer::{
    format_average_loss, format_nearest, nearest_report, run_training, run_training_with_progress,
    TrainEvent, TrainOptions, TrainReport,
};
