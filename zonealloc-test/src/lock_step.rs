//! A test-runner for flushing out data-races between allocations and deallocations.

use std::{
    hint,
    sync::{Arc, atomic::{AtomicBool, AtomicUsize, Ordering}},
    thread::{self, JoinHandle},
};

/// LockStep is a multi-thread coordinator running user-specified steps _in lock-step_ across threads.
///
/// LockStep allows the user to:
///
/// -   Register a Global state, shared across all threads.
/// -   Register N instances of a Local state, each dedicated to a single thread.
/// -   Register S steps, which will run on each thread, in lock-step with other threads.
///
/// No thread starts step Si before all threads are done with step Si-1, and all threads spin right before starting
/// step Si so that it starts as simultaneously as possible on each thread.
///
/// #   Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use zonealloc_test::LockStep;
///
/// let mut lock_step = LockStep::new(AtomicUsize::new(0), vec!(1, 10));
///
/// lock_step.add_step(|| |global: &AtomicUsize, local: &mut usize| { global.fetch_add(*local, Ordering::Relaxed); });
///
/// let global = lock_step.global();
/// let locals = lock_step.run(4);
///
/// assert_eq!(44, global.load(Ordering::Relaxed));
/// assert_eq!(vec!(1, 10), locals);
/// ```
pub struct LockStep<Global, Local> {
    global: Arc<Global>,
    locals: Vec<Local>,
    steps: Vec<Vec<Box<dyn FnMut(&Global, &mut Local) + Send + 'static>>>,
}

impl<Global, Local> LockStep<Global, Local>
    where
        Global: Send + Sync + 'static,
        Local: Send + 'static,
{
    /// Creates a new instance, running one thread per instance of `Local`.
    pub fn new(global: Global, locals: Vec<Local>) -> Self {
        assert!(!locals.is_empty(), "Cannot run in lock-step without a single thread");

        let global = Arc::new(global);
        let steps = locals.iter().map(|_| vec!()).collect();

        Self { global, locals, steps }
    }

    /// Returns the Global state.
    pub fn global(&self) -> Arc<Global> { self.global.clone() }

    /// Adds a step on each thread.
    ///
    /// The step is created by invoking `factory` for each thread.
    pub fn add_step<Factory, Step>(&mut self, mut factory: Factory)
        where
            Factory: FnMut() -> Step,
            Step: FnMut(&Global, &mut Local) + Send + 'static,
    {
        for serie in &mut self.steps {
            serie.push(Box::new(factory()));
        }
    }

    /// Runs each serie of steps `iterations` times, then returns the Local states.
    ///
    /// #   Panics
    ///
    /// -   If any step panicked, on any thread.
    pub fn run(self, iterations: usize) -> Vec<Local> {
        assert!(!self.steps[0].is_empty(), "Cannot run in lock-step without a single step");

        let rendez_vous = Arc::new(RendezVous::new(self.locals.len()));

        let threads: Vec<JoinHandle<Local>> = self.locals.into_iter()
            .zip(self.steps)
            .map(|(mut local, mut serie)| {
                let global = self.global.clone();
                let rendez_vous = rendez_vous.clone();

                thread::spawn(move || {
                    let guard = PoisonGuard(&rendez_vous);
                    let global = &*global;

                    for _ in 0..iterations {
                        for step in &mut serie {
                            rendez_vous.wait();

                            step(global, &mut local);
                        }
                    }

                    guard.dismiss();

                    local
                })
            })
            .collect();

        //  First join _all_ threads, then collect the results.
        let results: Vec<_> = threads.into_iter().map(|handle| handle.join()).collect();

        results.into_iter()
            .map(|result| result.unwrap_or_else(|_| panic!("A thread panicked during lock-step")))
            .collect()
    }
}

//
//  Implementation details
//

//  If a single thread panics, then all other threads waiting on the rendez-vous must be woken up.
struct PoisonGuard<'a>(&'a RendezVous);

impl<'a> PoisonGuard<'a> {
    fn dismiss(self) { std::mem::forget(self) }
}

impl<'a> Drop for PoisonGuard<'a> {
    fn drop(&mut self) { self.0.poison() }
}

//  A reusable spinning barrier.
//
//  The last thread to arrive re-arms the barrier, then opens it by bumping the generation.
struct RendezVous {
    count: usize,
    arrived: AtomicUsize,
    generation: AtomicUsize,
    poisoned: AtomicBool,
}

impl RendezVous {
    fn new(count: usize) -> Self {
        Self { count, arrived: AtomicUsize::new(0), generation: AtomicUsize::new(0), poisoned: AtomicBool::new(false) }
    }

    fn poison(&self) { self.poisoned.store(true, Ordering::Release); }

    fn wait(&self) {
        let generation = self.generation.load(Ordering::Acquire);

        if self.arrived.fetch_add(1, Ordering::AcqRel) + 1 == self.count {
            self.arrived.store(0, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::AcqRel);
            return;
        }

        while self.generation.load(Ordering::Acquire) == generation {
            if self.poisoned.load(Ordering::Acquire) {
                panic!("Someone poisoned the well!");
            }

            hint::spin_loop();
        }
    }
}

// mod tests
