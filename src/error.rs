use thiserror::Error;

/// Error returned by a task function. Anything convertible into a boxed
/// error works, so `?` and `Err("message".into())` both do.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("spin group title cannot be empty")]
    EmptyTitle,

    #[error("spin group has no tasks")]
    NoTasks,

    #[error("task at position {position} has an empty name")]
    EmptyTaskName { position: usize },

    /// A task function failed. Carries its error unchanged.
    #[error(transparent)]
    Task(TaskError),
}

impl Error {
    /// The task function's error, if this is one.
    pub fn task_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Task(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn task_errors_are_not_rewrapped() {
        let err = Error::Task(Box::new(DiskFull));
        assert_eq!(err.to_string(), "disk full");
        assert!(err.task_error().is_some_and(|e| e.is::<DiskFull>()));
        assert!(Error::NoTasks.task_error().is_none());
    }

    #[test]
    fn configuration_messages() {
        assert_eq!(
            Error::EmptyTaskName { position: 2 }.to_string(),
            "task at position 2 has an empty name"
        );
        assert_eq!(Error::EmptyTitle.to_string(), "spin group title cannot be empty");
    }
}
