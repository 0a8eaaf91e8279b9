/// A named phase of an execution plan.
///
/// The name shows up in logs and in [`StageMetrics`](super::StageMetrics);
/// the tasks run in the order given.
#[derive(Debug, Clone)]
pub struct Stage<T> {
    pub name: &'static str,
    pub tasks: Vec<T>,
}

impl<T> Stage<T> {
    pub fn new(name: &'static str, tasks: Vec<T>) -> Self {
        Self { name, tasks }
    }

    pub fn single(name: &'static str, task: T) -> Self {
        Self::new(name, vec![task])
    }
}
