use std::{cell::Cell, fmt, rc::Rc};

/// Identifier of a task registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Cancellation handle shared between the scheduler and whoever scheduled
/// the task. Cloning yields another handle to the same task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    fn new(id: TaskId) -> Self {
        Self {
            id,
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Stops all future runs. The current run, if any, finishes normally.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

type Callback<C> = Box<dyn FnMut(&mut C, &TaskHandle)>;

struct ScheduledTask<C> {
    handle: TaskHandle,
    next_run: u64,
    period: u64,
    callback: Callback<C>,
}

/// Fixed-rate, single-threaded task runner. Every call to [`Scheduler::tick`]
/// is one tick; tasks run serially in registration order.
pub struct Scheduler<C> {
    current_tick: u64,
    next_id: u64,
    tasks: Vec<ScheduledTask<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            current_tick: 0,
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` to run `initial_delay` ticks from now and then
    /// every `period` ticks until cancelled.
    ///
    /// # Panics
    /// If `period` is zero.
    pub fn schedule_repeating<F>(&mut self, initial_delay: u64, period: u64, callback: F) -> TaskHandle
    where
        F: FnMut(&mut C, &TaskHandle) + 'static,
    {
        assert!(period > 0, "repeating task period must be at least one tick");

        self.next_id += 1;
        let handle = TaskHandle::new(TaskId(self.next_id));
        self.tasks.push(ScheduledTask {
            handle: handle.clone(),
            next_run: self.current_tick + initial_delay,
            period,
            callback: Box::new(callback),
        });
        handle
    }

    /// Runs every due task once and returns how many ran.
    pub fn tick(&mut self, ctx: &mut C) -> usize {
        let now = self.current_tick;
        let mut ran = 0;

        for task in &mut self.tasks {
            if task.handle.is_cancelled() || task.next_run > now {
                continue;
            }
            (task.callback)(ctx, &task.handle);
            task.next_run = now + task.period;
            ran += 1;
        }

        self.tasks.retain(|task| !task.handle.is_cancelled());
        self.current_tick += 1;
        ran
    }

    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.handle.cancel();
        }
    }

    /// Number of ticks executed so far.
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Tasks that have not been cancelled yet.
    pub fn active_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| !task.handle.is_cancelled())
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.active_tasks() == 0
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("current_tick", &self.current_tick)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
