//! Structured logging macros.
//!
//! Every event carries a `subsystem` field; batch events also carry the
//! `batch` correlation id so one submission can be followed from packing
//! through unpacking.

/// Log an event with a subsystem field.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $subsystem:expr, $msg:literal $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a batch-scoped event with standard fields.
#[macro_export]
macro_rules! log_batch_event {
    ($level:ident, $subsystem:expr, $batch:expr, $msg:literal $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = $subsystem,
            batch = %$batch,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a task-scoped event with standard fields.
#[macro_export]
macro_rules! log_task_event {
    ($level:ident, $subsystem:expr, $batch:expr, $task_key:expr, $msg:literal $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = $subsystem,
            batch = %$batch,
            task_key = %$task_key,
            $($($field)*,)?
            $msg
        )
    };
}
