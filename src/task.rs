use std::sync::Arc;

use crate::error::TaskError;
use crate::group::SpinGroup;
use crate::TaskComponent;

/// Identifies a task within its [`SpinGroup`]. Ids are assigned in the
/// order tasks are added and stay valid for the group's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

impl TaskId {
    /// Position in insertion order (not execution order).
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// A snapshot of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: String,
    /// 0 for tasks added with [`SpinGroup::add_task`], parent depth + 1 for
    /// subtasks.
    pub depth: usize,
    pub parent: Option<TaskId>,
    pub status: TaskStatus,
}

pub(crate) type TaskFn = Arc<dyn Fn(&SpinGroup) -> Result<(), TaskError> + Send + Sync>;

pub(crate) struct Task {
    pub name: String,
    pub depth: usize,
    pub parent: Option<TaskId>,
    pub status: TaskStatus,
    pub component: Arc<dyn TaskComponent>,
    pub func: TaskFn,
    next: Option<TaskId>,
}

impl Task {
    pub fn new(name: String, component: Arc<dyn TaskComponent>, func: TaskFn) -> Self {
        Self {
            name,
            depth: 0,
            parent: None,
            status: TaskStatus::Pending,
            component,
            func,
            next: None,
        }
    }

    fn info(&self, id: TaskId) -> TaskInfo {
        TaskInfo {
            id,
            name: self.name.clone(),
            depth: self.depth,
            parent: self.parent,
            status: self.status,
        }
    }
}

/// Arena of tasks with their execution order kept as a singly linked list,
/// so subtasks splice in after the running task without moving anything.
#[derive(Default)]
pub(crate) struct TaskStore {
    tasks: Vec<Task>,
    head: Option<TaskId>,
    tail: Option<TaskId>,
    /// The executing task; subtasks are anchored to it.
    current: Option<TaskId>,
    /// The last subtask inserted for `current`, so the next one goes after it.
    last_inserted: Option<TaskId>,
}

impl TaskStore {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn alloc(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(task);
        id
    }

    /// Appends a top-level task at the end of the execution order.
    pub fn push(&mut self, task: Task) -> TaskId {
        let id = self.alloc(task);
        match self.tail {
            Some(tail) => self.tasks[tail.0].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Inserts a child of the executing task, after it and after any
    /// subtasks already inserted for it. With nothing executing this is
    /// [`TaskStore::push`].
    pub fn insert_subtask(&mut self, mut task: Task) -> TaskId {
        let Some(parent) = self.current else {
            return self.push(task);
        };
        let anchor = self.last_inserted.unwrap_or(parent);

        task.depth = self.tasks[parent.0].depth + 1;
        task.parent = Some(parent);
        task.next = self.tasks[anchor.0].next;

        let id = self.alloc(task);
        self.tasks[anchor.0].next = Some(id);
        if self.tail == Some(anchor) {
            self.tail = Some(id);
        }
        self.last_inserted = Some(id);
        id
    }

    pub fn first(&self) -> Option<TaskId> {
        self.head
    }

    pub fn next(&self, id: TaskId) -> Option<TaskId> {
        self.tasks.get(id.0).and_then(|t| t.next)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    /// Marks `id` as executing and makes it the subtask anchor.
    pub fn begin(&mut self, id: TaskId) {
        self.current = Some(id);
        self.last_inserted = None;
        if let Some(task) = self.tasks.get_mut(id.0) {
            task.status = TaskStatus::Running;
        }
    }

    pub fn finish(&mut self, id: TaskId, status: TaskStatus) {
        if let Some(task) = self.tasks.get_mut(id.0) {
            task.status = status;
        }
    }

    /// Clears the execution cursor.
    pub fn reset(&mut self) {
        self.current = None;
        self.last_inserted = None;
    }

    /// Ids in execution order.
    pub fn order(&self) -> impl Iterator<Item = TaskId> + '_ {
        std::iter::successors(self.head, |id| self.next(*id))
    }

    pub fn infos(&self) -> Vec<TaskInfo> {
        self.order()
            .filter_map(|id| self.get(id).map(|t| t.info(id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl TaskComponent for Noop {
        fn start(&self) {}
        fn complete(&self, _: &str) {}
        fn fail(&self, _: &str) {}
        fn set_output(&self, _: crate::output::SharedOutput) {}
    }

    fn succeed(_: &SpinGroup) -> Result<(), TaskError> {
        Ok(())
    }

    fn task(name: &str) -> Task {
        Task::new(name.to_string(), Arc::new(Noop), Arc::new(succeed))
    }

    fn names(store: &TaskStore) -> Vec<String> {
        store.infos().into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn push_keeps_insertion_order() {
        let mut store = TaskStore::default();
        store.push(task("a"));
        store.push(task("b"));
        store.push(task("c"));
        assert_eq!(names(&store), ["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn subtasks_follow_their_parent_in_call_order() {
        let mut store = TaskStore::default();
        let first = store.push(task("first"));
        store.push(task("second"));

        store.begin(first);
        let a = store.insert_subtask(task("a"));
        store.insert_subtask(task("b"));
        store.insert_subtask(task("c"));
        assert_eq!(names(&store), ["first", "a", "b", "c", "second"]);

        let info = &store.infos()[1];
        assert_eq!(info.depth, 1);
        assert_eq!(info.parent, Some(first));
        assert_eq!(info.id, a);
    }

    #[test]
    fn nested_subtasks_go_one_level_deeper() {
        let mut store = TaskStore::default();
        let root = store.push(task("root"));
        store.begin(root);
        let child = store.insert_subtask(task("child"));
        store.insert_subtask(task("sibling"));

        store.begin(child);
        store.insert_subtask(task("grandchild"));

        let infos = store.infos();
        let depths: Vec<_> = infos.iter().map(|t| (t.name.as_str(), t.depth)).collect();
        assert_eq!(
            depths,
            [("root", 0), ("child", 1), ("grandchild", 2), ("sibling", 1)]
        );
    }

    #[test]
    fn subtask_of_last_task_moves_the_tail() {
        let mut store = TaskStore::default();
        let only = store.push(task("only"));
        store.begin(only);
        store.insert_subtask(task("sub"));
        store.reset();
        store.push(task("after"));
        assert_eq!(names(&store), ["only", "sub", "after"]);
    }

    #[test]
    fn subtask_without_a_running_task_is_appended() {
        let mut store = TaskStore::default();
        store.push(task("a"));
        let id = store.insert_subtask(task("b"));
        assert_eq!(names(&store), ["a", "b"]);
        assert_eq!(store.get(id).map(|t| t.depth), Some(0));
    }

    #[test]
    fn status_follows_execution() {
        let mut store = TaskStore::default();
        let id = store.push(task("a"));
        assert_eq!(store.infos()[0].status, TaskStatus::Pending);
        store.begin(id);
        assert_eq!(store.infos()[0].status, TaskStatus::Running);
        store.finish(id, TaskStatus::Failed);
        assert_eq!(store.infos()[0].status, TaskStatus::Failed);
    }
}
