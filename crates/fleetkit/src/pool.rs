//! Bounded worker pool.
//!
//! A fixed set of workers share one [`TaskQueue`]. Each worker repeatedly
//! dequeues a host, renders and runs its command, classifies the result and
//! records it in the run's [`Aggregator`], until a dequeue reports empty.
//! [`WorkerPool::run`] returns only after every worker has terminated.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::aggregate::{Aggregator, Buckets};
use crate::classify::classify;
use crate::command::CommandBuilder;
use crate::error::{PoolError, Result, RunnerError};
use crate::queue::TaskQueue;
use crate::runner::CommandRunner;
use crate::types::{Classification, CommandOutput, Host, Outcome};

/// Pause between worker launches.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(50);

/// How long an idle worker waits on the queue before terminating.
pub const DEFAULT_DEQUEUE_TIMEOUT: Duration = Duration::from_secs(2);

/// Receives per-host events from the workers.
///
/// Called concurrently from every worker thread.
pub trait RunObserver: Sync {
    /// Called when a worker picks up a host
    fn on_start(&self, host: &Host) {
        let _ = host;
    }

    /// Called after a host's command exited and was classified
    fn on_complete(&self, host: &Host, output: &CommandOutput, classification: Classification) {
        let _ = (host, output, classification);
    }
}

/// Observer that ignores every event
pub struct NoObserver;

impl RunObserver for NoObserver {}

/// Options for a pool run
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Worker count; `None` derives it from available parallelism
    pub jobs: Option<usize>,
    /// Pause between worker launches
    pub stagger: Duration,
    /// Bounded wait for each dequeue
    pub dequeue_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            jobs: None,
            stagger: DEFAULT_STAGGER,
            dequeue_timeout: DEFAULT_DEQUEUE_TIMEOUT,
        }
    }
}

impl PoolOptions {
    /// Twice the available parallelism, at least one.
    pub fn default_jobs() -> usize {
        let cpus = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        (cpus * 2).max(1)
    }

    /// Number of workers to start for `tasks` queued hosts.
    ///
    /// Never more workers than tasks.
    pub fn worker_count(&self, tasks: usize) -> usize {
        let jobs = self.jobs.unwrap_or_else(Self::default_jobs).max(1);
        jobs.min(tasks)
    }
}

/// Fixed-size pool draining a [`TaskQueue`].
#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    options: PoolOptions,
}

impl WorkerPool {
    pub fn new(options: PoolOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Drain `queue`, attempting every host exactly once.
    ///
    /// Per-host failures land in their bucket. If the runner cannot start a
    /// command at all, the queue is drained, in-flight hosts finish, and
    /// [`PoolError::Infrastructure`] is returned with the partial buckets.
    pub fn run<B, R, O>(
        &self,
        queue: &TaskQueue,
        builder: &B,
        runner: &R,
        observer: &O,
    ) -> Result<Buckets>
    where
        B: CommandBuilder + ?Sized,
        R: CommandRunner + ?Sized,
        O: RunObserver + ?Sized,
    {
        let aggregator = Aggregator::new();
        let workers = self.options.worker_count(queue.len());
        if workers == 0 {
            log::info!("No hosts queued, nothing to bootstrap");
            return Ok(aggregator.into_buckets());
        }

        log::info!("Starting {} workers for {} hosts", workers, queue.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("knifepool-worker-{i}"))
            .build()?;

        let escalation = Escalation::default();
        let ctx = Worker {
            queue,
            builder,
            runner,
            observer,
            aggregator: &aggregator,
            escalation: &escalation,
            dequeue_timeout: self.options.dequeue_timeout,
        };

        pool.in_place_scope(|scope| {
            for id in 0..workers {
                if queue.is_empty() {
                    log::debug!("Queue drained after launching {id} workers");
                    break;
                }
                let ctx = &ctx;
                scope.spawn(move |_| ctx.work(id));

                if id + 1 < workers && !self.options.stagger.is_zero() {
                    thread::sleep(self.options.stagger);
                }
            }
        });

        let buckets = aggregator.into_buckets();
        match escalation.take() {
            None => Ok(buckets),
            Some(fault) => Err(PoolError::Infrastructure {
                host: fault.host,
                source: fault.source,
                abandoned: fault.abandoned,
                partial: buckets,
            }),
        }
    }
}

/// Borrowed state shared by every worker of one run.
struct Worker<'a, B: ?Sized, R: ?Sized, O: ?Sized> {
    queue: &'a TaskQueue,
    builder: &'a B,
    runner: &'a R,
    observer: &'a O,
    aggregator: &'a Aggregator,
    escalation: &'a Escalation,
    dequeue_timeout: Duration,
}

impl<B, R, O> Worker<'_, B, R, O>
where
    B: CommandBuilder + ?Sized,
    R: CommandRunner + ?Sized,
    O: RunObserver + ?Sized,
{
    fn work(&self, id: usize) {
        log::trace!("worker {id} started");
        let mut completed = 0usize;

        while let Some(host) = self.queue.dequeue(self.dequeue_timeout) {
            match self.provision(&host) {
                Ok(classification) => {
                    self.aggregator.record(Outcome::new(host, classification));
                    completed += 1;
                }
                Err(source) => {
                    log::error!("Could not start bootstrap for {host}: {source}");
                    let abandoned = self.queue.drain();
                    self.escalation.raise(host, source, abandoned);
                    break;
                }
            }
        }

        log::debug!("worker {id} terminated after {completed} hosts");
    }

    fn provision(&self, host: &Host) -> std::result::Result<Classification, RunnerError> {
        self.observer.on_start(host);

        let command = self.builder.build(host);
        let output = self.runner.run(&command)?;
        let classification = classify(&output.combined, output.exit_code);
        log::debug!(
            "{host}: {classification:?} (exit code {})",
            output.exit_code
        );

        self.observer.on_complete(host, &output, classification);
        Ok(classification)
    }
}

struct Fault {
    host: Host,
    source: RunnerError,
    abandoned: Vec<Host>,
}

/// First infrastructure fault of a run; later faults only add hosts.
#[derive(Default)]
struct Escalation {
    fault: Mutex<Option<Fault>>,
}

impl Escalation {
    fn raise(&self, host: Host, source: RunnerError, abandoned: Vec<Host>) {
        let mut slot = match self.fault.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slot.as_mut() {
            Some(first) => {
                log::warn!("Additional infrastructure failure on {host}: {source}");
                first.abandoned.push(host);
                first.abandoned.extend(abandoned);
            }
            None => {
                *slot = Some(Fault {
                    host,
                    source,
                    abandoned,
                });
            }
        }
    }

    fn take(self) -> Option<Fault> {
        match self.fault.into_inner() {
            Ok(fault) => fault,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted runner keyed by the rendered command (the hostname).
    #[derive(Default)]
    struct ScriptedRunner {
        scripts: HashMap<String, CommandOutput>,
        unstartable: Option<String>,
        delay: Duration,
        invocations: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedRunner {
        fn with(mut self, hostname: &str, output: &str, exit_code: i32) -> Self {
            self.scripts.insert(
                hostname.to_string(),
                CommandOutput::new(output.as_bytes(), exit_code),
            );
            self
        }

        fn calls(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }

        /// Most commands that were ever running at the same time
        fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: &str) -> std::result::Result<CommandOutput, RunnerError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if self.unstartable.as_deref() == Some(command) {
                return Err(RunnerError::Other("sh: not found".into()));
            }
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(self.scripts.get(command).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        started: AtomicUsize,
        completed: AtomicUsize,
    }

    impl RunObserver for CountingObserver {
        fn on_start(&self, _host: &Host) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_complete(&self, _host: &Host, _output: &CommandOutput, _c: Classification) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn hostname_builder(host: &Host) -> String {
        host.hostname.clone()
    }

    fn hosts(n: usize) -> Vec<Host> {
        (0..n)
            .map(|i| Host::new(format!("host{i}"), "example.com", "prod", "role[base]"))
            .collect()
    }

    fn options(jobs: usize) -> PoolOptions {
        PoolOptions {
            jobs: Some(jobs),
            stagger: Duration::ZERO,
            dequeue_timeout: Duration::from_millis(50),
        }
    }

    fn mixed_runner() -> ScriptedRunner {
        ScriptedRunner::default()
            .with("host0", "Authentication failed", 1)
            .with("host1", "ConnectionTimeout", 1)
            .with("host2", "nodename nor servname provided", 1)
            .with("host3", "", 1)
            .with("host4", "", 100)
            .with("host5", "Chef Client finished", 0)
    }

    fn run(jobs: usize, hosts: Vec<Host>, runner: &ScriptedRunner) -> Buckets {
        let queue = TaskQueue::from_hosts(hosts).unwrap();
        WorkerPool::new(options(jobs))
            .run(&queue, &hostname_builder, runner, &NoObserver)
            .unwrap()
    }

    fn as_sets(buckets: &Buckets) -> Vec<BTreeSet<String>> {
        Classification::ALL
            .iter()
            .map(|c| buckets.get(*c).iter().map(|h| h.hostname.clone()).collect())
            .collect()
    }

    #[test]
    fn test_worker_count_bounded_by_tasks() {
        assert_eq!(options(8).worker_count(3), 3);
        assert_eq!(options(2).worker_count(10), 2);
        assert_eq!(options(0).worker_count(10), 1);
        assert_eq!(options(4).worker_count(0), 0);
    }

    #[test]
    fn test_default_jobs_uses_parallelism() {
        let jobs = PoolOptions::default_jobs();
        assert!(jobs >= 2);
        assert_eq!(jobs % 2, 0);
        assert_eq!(PoolOptions::default().worker_count(1), 1);
    }

    #[test]
    fn test_empty_queue_runs_nothing() {
        let runner = ScriptedRunner::default();
        let buckets = run(4, Vec::new(), &runner);
        assert_eq!(buckets.total(), 0);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn test_every_task_lands_in_exactly_one_bucket() {
        for n in [1, 7, 50] {
            for p in [1, 2, 8] {
                let runner = mixed_runner();
                let buckets = run(p, hosts(n), &runner);

                let mut seen: Vec<String> = Classification::ALL
                    .iter()
                    .flat_map(|c| buckets.get(*c).iter().map(|h| h.hostname.clone()))
                    .collect();
                seen.sort();
                let mut expected: Vec<String> = hosts(n).into_iter().map(|h| h.hostname).collect();
                expected.sort();

                assert_eq!(seen, expected, "n={n} p={p}");
                assert_eq!(runner.calls(), n, "each host attempted once (n={n} p={p})");
            }
        }
    }

    #[test]
    fn test_concurrency_degree_does_not_change_buckets() {
        let single = run(1, hosts(40), &mixed_runner());
        let many = run(8, hosts(40), &mixed_runner());
        assert_eq!(as_sets(&single), as_sets(&many));
    }

    #[test]
    fn test_failures_are_classified_not_fatal() {
        let buckets = run(3, hosts(6), &mixed_runner());
        for (classification, hostname) in [
            (Classification::AuthFailure, "host0"),
            (Classification::TimeoutFailure, "host1"),
            (Classification::DnsFailure, "host2"),
            (Classification::GeneralFailure, "host3"),
            (Classification::ToolFailure, "host4"),
            (Classification::Success, "host5"),
        ] {
            let bucket = buckets.get(classification);
            assert_eq!(bucket.len(), 1, "{classification:?}");
            assert_eq!(bucket[0].hostname, hostname);
        }
    }

    #[test]
    fn test_single_worker_preserves_queue_order() {
        let buckets = run(1, hosts(5), &ScriptedRunner::default());
        let order: Vec<_> = buckets
            .get(Classification::Success)
            .iter()
            .map(|h| h.hostname.as_str())
            .collect();
        assert_eq!(order, vec!["host0", "host1", "host2", "host3", "host4"]);
    }

    #[test]
    fn test_observer_sees_every_host() {
        let queue = TaskQueue::from_hosts(hosts(12)).unwrap();
        let observer = CountingObserver::default();
        WorkerPool::new(options(4))
            .run(&queue, &hostname_builder, &ScriptedRunner::default(), &observer)
            .unwrap();
        assert_eq!(observer.started.load(Ordering::SeqCst), 12);
        assert_eq!(observer.completed.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_slow_commands_overlap() {
        let runner = ScriptedRunner {
            delay: Duration::from_millis(100),
            ..ScriptedRunner::default()
        };
        let buckets = run(4, hosts(4), &runner);
        assert_eq!(buckets.total(), 4);
        assert!(runner.peak() > 1, "commands never overlapped");
        assert!(runner.peak() <= 4);
    }

    #[test]
    fn test_single_worker_never_overlaps() {
        let runner = ScriptedRunner {
            delay: Duration::from_millis(5),
            ..ScriptedRunner::default()
        };
        run(1, hosts(6), &runner);
        assert_eq!(runner.peak(), 1);
    }

    #[test]
    fn test_unstartable_command_escalates() {
        let runner = ScriptedRunner {
            unstartable: Some("host1".into()),
            ..ScriptedRunner::default()
        };
        let queue = TaskQueue::from_hosts(hosts(4)).unwrap();
        let err = WorkerPool::new(options(1))
            .run(&queue, &hostname_builder, &runner, &NoObserver)
            .unwrap_err();

        match err {
            PoolError::Infrastructure {
                host,
                abandoned,
                partial,
                ..
            } => {
                assert_eq!(host.hostname, "host1");
                let abandoned: Vec<_> = abandoned.iter().map(|h| h.hostname.as_str()).collect();
                assert_eq!(abandoned, vec!["host2", "host3"]);
                assert_eq!(partial.total(), 1);
                assert_eq!(partial.get(Classification::Success)[0].hostname, "host0");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.calls(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unstartable_command_accounts_for_every_host() {
        let runner = ScriptedRunner {
            unstartable: Some("host3".into()),
            delay: Duration::from_millis(5),
            ..ScriptedRunner::default()
        };
        let queue = TaskQueue::from_hosts(hosts(30)).unwrap();
        let err = WorkerPool::new(options(4))
            .run(&queue, &hostname_builder, &runner, &NoObserver)
            .unwrap_err();

        let PoolError::Infrastructure {
            abandoned, partial, ..
        } = err
        else {
            panic!("expected infrastructure failure");
        };
        assert_eq!(partial.total() + abandoned.len() + 1, 30);
    }
}
