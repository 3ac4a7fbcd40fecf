use thiserror::Error;

use crate::model::{
    CertificateError, CourseDraftError, CourseError, LessonError, TicketError, UserError,
    VideoError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    CourseDraft(#[from] CourseDraftError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Video(#[from] VideoError),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    #[error(transparent)]
    Ticket(#[from] TicketError),
}
