//! # Pipeline Module
//!
//! A small dependency-graph executor over named stages.
//!
//! Each [`Stage`] declares the stages it depends on, the context key it
//! publishes its result under and a unit of work. Work receives a [`Context`]
//! holding exactly the results of its declared dependencies; reading any
//! other key is an error, so the graph declaration is the only channel
//! between stages.
//!
//! ## Execution
//!
//! The graph is validated before anything runs. Execution then proceeds in
//! waves: every pending stage whose dependencies are all resolved joins the
//! wave, the wave's stages run concurrently, their results are published and
//! the next wave starts. A graph of `{a, b} -> c -> d` therefore runs `a`
//! and `b` together and `c`, `d` one after the other.
//!
//! The executor fails fast: the first failing stage drops the rest of its
//! wave and every later stage, and the error is returned annotated with the
//! stage name (see [`Error::Stage`]).
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let context = Pipeline::new()
//!     .stage(Stage::new("fetch", |_| async { Ok::<_, Error>(vec![1, 2, 3]) }))
//!     .stage(
//!         Stage::new("sum", |ctx: Arc<Context>| async move {
//!             Ok(ctx.get::<Vec<i32>>("fetch")?.iter().sum::<i32>())
//!         })
//!         .depends_on(["fetch"]),
//!     )
//!     .run()
//!     .await?;
//! ```

pub mod randomize;

use std::{
    any::Any,
    collections::{HashMap, HashSet},
    fmt,
    future::Future,
    sync::Arc,
};

use futures::{
    FutureExt,
    future::{BoxFuture, try_join_all},
};

use crate::{Res, error::Error, info, success, warning};

/// Type-erased stage result.
pub type Value = Arc<dyn Any + Send + Sync>;

type Work = Box<dyn FnOnce(Arc<Context>) -> BoxFuture<'static, Res<Value>> + Send>;

/// Write-once map from context key to stage result.
///
/// One context belongs to one pipeline run and is never shared across runs.
#[derive(Clone, Default)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed read of `key`.
    ///
    /// # Errors
    ///
    /// [`Error::Graph`] when the key is absent or holds another type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Res<Arc<T>> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| Error::Graph(format!("'{}' is not available in this context", key)))?;

        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| Error::Graph(format!("'{}' holds a value of another type", key)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// [`Error::Graph`] if the key was already written.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) -> Res<()> {
        self.publish(key.into(), Arc::new(value))
    }

    fn publish(&mut self, key: String, value: Value) -> Res<()> {
        if self.values.contains_key(&key) {
            return Err(Error::Graph(format!("'{}' was already published", key)));
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Copy holding only `keys`.
    fn scoped<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Self {
        let values = keys
            .into_iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.clone(), Arc::clone(v))))
            .collect();
        Self { values }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// A named unit of work in a [`Pipeline`].
pub struct Stage {
    name: String,
    depends_on: Vec<String>,
    publishes: String,
    work: Work,
}

impl Stage {
    /// Creates a stage publishing under its own name with no dependencies.
    pub fn new<T, F, Fut>(name: impl Into<String>, work: F) -> Self
    where
        T: Any + Send + Sync,
        F: FnOnce(Arc<Context>) -> Fut + Send + 'static,
        Fut: Future<Output = Res<T>> + Send + 'static,
    {
        let name = name.into();
        let work: Work = Box::new(move |ctx: Arc<Context>| {
            let fut = work(ctx);
            async move { fut.await.map(|v| Arc::new(v) as Value) }.boxed()
        });

        Self {
            publishes: name.clone(),
            name,
            depends_on: Vec::new(),
            work,
        }
    }

    /// Names of the stages whose results this stage reads.
    pub fn depends_on<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(stages.into_iter().map(Into::into));
        self
    }

    /// Context key the result is published under.
    pub fn publishes(mut self, key: impl Into<String>) -> Self {
        self.publishes = key.into();
        self
    }
}

/// A declared graph of stages, run once.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Stage names grouped by the wave they run in.
    ///
    /// # Errors
    ///
    /// [`Error::Graph`] for duplicate stage names or publish keys, unknown or
    /// self dependencies, and cycles.
    pub fn plan(&self) -> Res<Vec<Vec<String>>> {
        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        for stage in &self.stages {
            if !names.insert(stage.name.as_str()) {
                return Err(Error::Graph(format!("duplicate stage '{}'", stage.name)));
            }
            if !keys.insert(stage.publishes.as_str()) {
                return Err(Error::Graph(format!(
                    "key '{}' is published by more than one stage",
                    stage.publishes
                )));
            }
        }

        for stage in &self.stages {
            for dep in &stage.depends_on {
                if dep == &stage.name {
                    return Err(Error::Graph(format!("stage '{}' depends on itself", dep)));
                }
                if !names.contains(dep.as_str()) {
                    return Err(Error::Graph(format!(
                        "stage '{}' depends on unknown stage '{}'",
                        stage.name, dep
                    )));
                }
            }
        }

        let mut resolved: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&Stage> = self.stages.iter().collect();
        let mut waves = Vec::new();
        while !pending.is_empty() {
            let (ready, waiting): (Vec<&Stage>, Vec<&Stage>) = pending
                .into_iter()
                .partition(|s| s.depends_on.iter().all(|d| resolved.contains(d.as_str())));

            if ready.is_empty() {
                let stuck: Vec<&str> = waiting.iter().map(|s| s.name.as_str()).collect();
                return Err(Error::Graph(format!("dependency cycle between {}", stuck.join(", "))));
            }

            resolved.extend(ready.iter().map(|s| s.name.as_str()));
            waves.push(ready.iter().map(|s| s.name.clone()).collect());
            pending = waiting;
        }

        Ok(waves)
    }

    /// Runs every stage and returns the populated context.
    ///
    /// # Errors
    ///
    /// [`Error::Graph`] if the graph is invalid (nothing runs then), or the
    /// first stage failure wrapped in [`Error::Stage`].
    pub async fn run(self) -> Res<Context> {
        let waves = self.plan()?;

        let keys: HashMap<String, String> = self
            .stages
            .iter()
            .map(|s| (s.name.clone(), s.publishes.clone()))
            .collect();
        let mut stages: HashMap<String, Stage> = self
            .stages
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();

        let mut context = Context::new();
        for wave in waves {
            let mut running = Vec::with_capacity(wave.len());
            for name in &wave {
                let Some(stage) = stages.remove(name) else {
                    return Err(Error::Graph(format!("stage '{}' scheduled twice", name)));
                };
                let scoped = context.scoped(stage.depends_on.iter().filter_map(|d| keys.get(d)));
                running.push(run_stage(stage, scoped));
            }

            for (key, value) in try_join_all(running).await? {
                context.publish(key, value)?;
            }
        }

        Ok(context)
    }
}

async fn run_stage(stage: Stage, scoped: Context) -> Res<(String, Value)> {
    let Stage {
        name,
        publishes,
        work,
        ..
    } = stage;

    info!("Stage {} started", name);
    match work(Arc::new(scoped)).await {
        Ok(value) => {
            success!("Stage {} finished", name);
            Ok((publishes, value))
        }
        Err(e) => {
            warning!("Stage {} failed: {}", name, e);
            Err(e.in_stage(name))
        }
    }
}
