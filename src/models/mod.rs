pub mod workout;

pub use workout::{
  new_session_id, Exercise, ExerciseCategory, ExerciseSet, User, WorkoutSession, WorkoutType,
};
