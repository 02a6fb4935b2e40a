//! Sequential task execution with subtasks discovered at run time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::TaskComponent;
use crate::error::{Error, Result, TaskError};
use crate::frame::Frame;
use crate::output::SharedOutput;
use crate::task::{Task, TaskFn, TaskId, TaskInfo, TaskStatus, TaskStore};
use crate::writer::IndentedWriter;

#[derive(Default)]
struct GroupState {
    tasks: TaskStore,
    running: bool,
    started_at: Option<Instant>,
}

/// Runs tasks one after another, each driving its own component.
///
/// A task function receives its component and the group, so it can
/// schedule subtasks with [`SpinGroup::add_subtask`]. Subtasks run right
/// after the task that added them, one indentation level deeper, before
/// the next task that was already scheduled.
///
/// ```rust,ignore
/// let group = SpinGroup::new("Deploy");
/// group.add_task("Discover services", Spinner::new("Discovering"), |spinner, group| {
///     for service in discover()? {
///         let name = service.name().to_string();
///         group.add_subtask(name.clone(), Spinner::new(name), move |_, _| service.deploy());
///     }
///     spinner.update_message("Discovered");
///     Ok(())
/// });
/// group.add_task("Verify", Progress::new("Verify", 3), |progress, _| {
///     for check in 1..=3 {
///         progress.update(check, format!("check {check}"));
///     }
///     Ok(())
/// });
/// group.run_in_frame()?;
/// ```
///
/// The first task error stops the run: its component is failed with the
/// error's message and the error is returned unchanged in
/// [`Error::Task`]. Nothing after it runs.
pub struct SpinGroup {
    title: String,
    state: Mutex<GroupState>,
    output: RwLock<SharedOutput>,
}

impl std::fmt::Debug for SpinGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinGroup")
            .field("title", &self.title)
            .field("tasks", &self.tasks())
            .field("running", &self.is_running())
            .finish()
    }
}

impl SpinGroup {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: Mutex::new(GroupState::default()),
            output: RwLock::new(crate::output::stdout()),
        }
    }

    /// Where tasks render. Defaults to stdout.
    pub fn output(self, output: SharedOutput) -> Self {
        self.set_output(output);
        self
    }

    pub fn set_output(&self, output: SharedOutput) {
        self.replace_output(output);
    }

    fn replace_output(&self, output: SharedOutput) -> SharedOutput {
        let mut current = self.output.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, output)
    }

    fn current_output(&self) -> SharedOutput {
        self.output
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn task<C, F>(name: String, component: C, f: F) -> Task
    where
        C: TaskComponent + 'static,
        F: Fn(&C, &SpinGroup) -> std::result::Result<(), TaskError> + Send + Sync + 'static,
    {
        let component = Arc::new(component);
        let handle: Arc<dyn TaskComponent> = component.clone();
        let func: TaskFn = Arc::new(move |group: &SpinGroup| f(&*component, group));
        Task::new(name, handle, func)
    }

    /// Schedules a top-level task after every task already scheduled.
    pub fn add_task<C, F>(&self, name: impl Into<String>, component: C, f: F) -> TaskId
    where
        C: TaskComponent + 'static,
        F: Fn(&C, &SpinGroup) -> std::result::Result<(), TaskError> + Send + Sync + 'static,
    {
        let task = Self::task(name.into(), component, f);
        self.lock().tasks.push(task)
    }

    /// Schedules a child of the executing task. It runs after the executing
    /// task and after any subtasks it already added, one level deeper.
    ///
    /// Safe to call from threads spawned by the task function; subtasks
    /// added concurrently run in the order their calls reached the group.
    /// Called while nothing is executing, this behaves like
    /// [`SpinGroup::add_task`].
    pub fn add_subtask<C, F>(&self, name: impl Into<String>, component: C, f: F) -> TaskId
    where
        C: TaskComponent + 'static,
        F: Fn(&C, &SpinGroup) -> std::result::Result<(), TaskError> + Send + Sync + 'static,
    {
        let name = name.into();
        let task = Self::task(name.clone(), component, f);
        let (id, depth) = {
            let mut state = self.lock();
            let id = state.tasks.insert_subtask(task);
            let depth = state.tasks.get(id).map_or(0, |t| t.depth);
            (id, depth)
        };
        debug!(task = %name, depth, "subtask added");
        id
    }

    fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::EmptyTitle);
        }
        let state = self.lock();
        if state.tasks.is_empty() {
            return Err(Error::NoTasks);
        }
        for (position, id) in state.tasks.order().enumerate() {
            if state.tasks.get(id).is_some_and(|t| t.name.is_empty()) {
                return Err(Error::EmptyTaskName { position });
            }
        }
        Ok(())
    }

    /// Runs every task in order, including subtasks added along the way.
    ///
    /// Configuration errors are returned before anything is drawn.
    pub fn run(&self) -> Result<()> {
        self.validate()?;

        {
            let mut state = self.lock();
            state.running = true;
            state.started_at = Some(Instant::now());
        }
        let _cursor = RunGuard { group: self };
        debug!(title = %self.title, tasks = self.task_count(), "spin group started");

        let result = self.run_tasks();
        match &result {
            Ok(()) => debug!(title = %self.title, elapsed = ?self.elapsed(), "spin group finished"),
            Err(err) => debug!(title = %self.title, error = %err, "spin group failed"),
        }
        result
    }

    fn run_tasks(&self) -> Result<()> {
        let mut next = self.lock().tasks.first();
        let mut position = 0;

        while let Some(id) = next {
            let (name, depth, component, func) = {
                let mut state = self.lock();
                let Some(task) = state.tasks.get(id) else {
                    break;
                };
                let snapshot = (
                    task.name.clone(),
                    task.depth,
                    Arc::clone(&task.component),
                    Arc::clone(&task.func),
                );
                state.tasks.begin(id);
                snapshot
            };

            if name.is_empty() {
                self.lock().tasks.finish(id, TaskStatus::Failed);
                return Err(Error::EmptyTaskName { position });
            }

            debug!(task = %name, depth, "task started");
            component.set_output(IndentedWriter::wrap(self.current_output(), depth));
            component.start();

            if let Err(err) = func(self) {
                component.fail(&err.to_string());
                self.lock().tasks.finish(id, TaskStatus::Failed);
                debug!(task = %name, error = %err, "task failed");
                return Err(Error::Task(err));
            }

            component.complete("");
            self.lock().tasks.finish(id, TaskStatus::Completed);
            debug!(task = %name, "task completed");

            next = self.lock().tasks.next(id);
            position += 1;
        }
        Ok(())
    }

    /// Like [`SpinGroup::run`], inside a frame titled with the group's
    /// title. The frame is closed and the previous output restored however
    /// the run ends.
    pub fn run_in_frame(&self) -> Result<()> {
        let frame = Frame::builder(self.title.clone())
            .output(self.current_output())
            .open();
        let previous = self.replace_output(Arc::new(frame.clone()));
        let _frame = FrameGuard {
            group: self,
            frame,
            previous: Some(previous),
        };
        self.run()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of scheduled tasks, executed or not.
    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Every task in execution order.
    pub fn tasks(&self) -> Vec<TaskInfo> {
        self.lock().tasks.infos()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Time since the current or most recent run started.
    pub fn elapsed(&self) -> Duration {
        self.lock()
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }
}

/// Clears the execution cursor when a run ends, including by panic.
struct RunGuard<'a> {
    group: &'a SpinGroup,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.group.lock();
        state.tasks.reset();
        state.running = false;
    }
}

struct FrameGuard<'a> {
    group: &'a SpinGroup,
    frame: Frame,
    previous: Option<SharedOutput>,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.group.replace_output(previous);
        }
        let _ = self.frame.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Buffer;
    use crate::widgets::Spinner;

    fn quiet(name: &str) -> Spinner {
        Spinner::new(name).suppress_render(true)
    }

    #[test]
    fn validation_happens_before_drawing() {
        let buf = Buffer::new();
        let group = SpinGroup::new("").output(buf.shared());
        group.add_task("a", quiet("a"), |_, _| Ok(()));
        assert!(matches!(group.run(), Err(Error::EmptyTitle)));

        let group = SpinGroup::new("T").output(buf.shared());
        assert!(matches!(group.run(), Err(Error::NoTasks)));

        group.add_task("a", quiet("a"), |_, _| Ok(()));
        group.add_task("", quiet("b"), |_, _| Ok(()));
        assert!(matches!(
            group.run(),
            Err(Error::EmptyTaskName { position: 1 })
        ));
        assert_eq!(buf.contents(), "");
        assert!(group.tasks().iter().all(|t| t.status == TaskStatus::Pending));
    }

    #[test]
    fn status_and_cursor_reset_after_run() {
        let group = SpinGroup::new("T").output(Buffer::new().shared());
        group.add_task("a", quiet("a"), |_, group| {
            assert!(group.is_running());
            Ok(())
        });
        group.add_task("b", quiet("b"), |_, _| Err("nope".into()));
        group.add_task("c", quiet("c"), |_, _| Ok(()));

        assert!(group.run().is_err());
        assert!(!group.is_running());
        let statuses: Vec<_> = group.tasks().into_iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            [TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Pending]
        );

        // with no task executing, subtasks append at the top level
        let id = group.add_subtask("d", quiet("d"), |_, _| Ok(()));
        assert_eq!(group.tasks().last().map(|t| (t.id, t.depth)), Some((id, 0)));
    }
}
