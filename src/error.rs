use thiserror::Error;

// AlreadyCompleted is deliberately absent: completing a lecture twice is a
// successful no-op, not an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lecture {lecture_id} does not belong to course {course_id}")]
    InvalidLectureReference { course_id: i64, lecture_id: i64 },

    #[error("invalid event sequence: {0}")]
    InvalidEventSequence(String),

    #[error("learner '{0}' not found")]
    LearnerNotFound(String),

    #[error("course {0} not found")]
    CourseNotFound(i64),

    #[error("learner {learner_id} is not enrolled in course {course_id}")]
    NotEnrolled { learner_id: i64, course_id: i64 },

    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
