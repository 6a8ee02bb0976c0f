use std::{ptr::NonNull, sync::Mutex};

use serial_test::serial;

use zonealloc::ZoneAllocator;
use zonealloc_test::{fill, read_number, verify, LockStep};

static ZONE_ALLOCATOR: ZoneAllocator = ZoneAllocator::new();

//
//  Tests
//

#[serial]
#[test]
fn write_then_verify() {
    //  Test that blocks concurrently allocated never overlap, and that the directory grows as needed.
    //
    //  Each thread allocates a batch of blocks, large enough that all threads together overflow the initial zones,
    //  and fills them with its own pattern. Only once all threads are done are the blocks verified, then freed.

    const BATCH: usize = 64;

    let _heap = HeapGuard::new();

    let number_threads = number_threads();
    let locals = (0..number_threads).map(Batch::new).collect();

    let mut lock_step = LockStep::new((), locals);

    lock_step.add_step(|| |_: &(), batch: &mut Batch| {
        for index in 0..BATCH {
            batch.allocate(1024 + (index * 97) % 7168);
        }
    });

    lock_step.add_step(|| |_: &(), batch: &mut Batch| batch.verify_and_free());

    lock_step.run(number_iterations());

    assert!(ZONE_ALLOCATOR.number_zones().unwrap_or(0) > 8);
}

#[serial]
#[test]
fn producer_consumer_ring() {
    //  Test that blocks can be deallocated on a different thread than the one which allocated them.
    //
    //  Each thread allocates a batch into its own slot of the ring, then verifies and frees the next slot batch.

    const BATCH: usize = 256;

    let _heap = HeapGuard::new();

    let number_threads = number_threads();
    let ring = Ring::new(number_threads);

    let mut lock_step = LockStep::new(ring, (0..number_threads).collect());

    lock_step.add_step(|| |ring: &Ring, index: &mut usize| {
        let mut batch = Batch::new(*index);

        for size in 0..BATCH {
            batch.allocate(16 + size * 4);
        }

        ring.put(*index, batch);
    });

    lock_step.add_step(|| |ring: &Ring, index: &mut usize| {
        let mut batch = ring.take((*index + 1) % ring.len());

        batch.verify_and_free();
    });

    lock_step.run(number_iterations());
}

#[serial]
#[test]
fn realloc_grow_shrink() {
    //  Test that content is preserved across reallocations, including when the block moves to another zone.

    //  Grows from 16 bytes to 16 KB, then shrinks back.
    const SIZES: [usize; 12] = [16, 64, 256, 1024, 4096, 16384, 16384, 4096, 1024, 256, 64, 16];

    let _heap = HeapGuard::new();

    let number_threads = number_threads();
    let locals = (0..number_threads).map(Buffer::new).collect();

    let mut lock_step = LockStep::new((), locals);

    for size in SIZES {
        lock_step.add_step(move || move |_: &(), buffer: &mut Buffer| buffer.resize(size));
    }

    let buffers = lock_step.run(number_iterations());

    for buffer in buffers {
        buffer.free();
    }
}

//
//  Helpers
//

fn number_iterations() -> usize { read_number("ZONEALLOC_MULTI_NUMBER_ITERATIONS", 10) }

//  At least 2 threads, for the initial zones to overflow.
fn number_threads() -> usize { read_number("ZONEALLOC_MULTI_NUMBER_THREADS", num_cpus::get()).max(2) }

//  Creates the process-wide heap, and destroys it on drop.
struct HeapGuard;

impl HeapGuard {
    fn new() -> Self {
        ZONE_ALLOCATOR.heap_create().unwrap();

        assert_eq!(Some(8), ZONE_ALLOCATOR.number_zones());

        Self
    }
}

impl Drop for HeapGuard {
    fn drop(&mut self) { unsafe { ZONE_ALLOCATOR.heap_kill() } }
}

//  A set of live blocks, each filled with the pattern of `seed`.
struct Batch {
    seed: u8,
    //  Pointers are stored as addresses, to be sent across threads.
    blocks: Vec<(usize, usize)>,
}

impl Batch {
    fn new(index: usize) -> Self { Self { seed: (index * 37) as u8, blocks: vec!() } }

    fn allocate(&mut self, size: usize) {
        let pointer = ZONE_ALLOCATOR.mt_malloc(size).unwrap();

        unsafe { fill(pointer, size, self.seed) };

        self.blocks.push((pointer.as_ptr() as usize, size));
    }

    fn verify_and_free(&mut self) {
        for (address, size) in self.blocks.drain(..) {
            let pointer = NonNull::new(address as *mut u8).unwrap();

            assert_eq!(Ok(()), unsafe { verify(pointer, size, self.seed) }, "{:x} - {}", address, size);

            unsafe { ZONE_ALLOCATOR.mt_free(pointer.as_ptr()) };
        }
    }
}

struct Ring(Vec<Mutex<Option<Batch>>>);

impl Ring {
    fn new(size: usize) -> Self { Self((0..size).map(|_| Mutex::new(None)).collect()) }

    fn len(&self) -> usize { self.0.len() }

    fn put(&self, index: usize, batch: Batch) {
        let previous = self.0[index].lock().unwrap().replace(batch);

        assert!(previous.is_none());
    }

    fn take(&self, index: usize) -> Batch { self.0[index].lock().unwrap().take().unwrap() }
}

//  A single block, resized over and over.
struct Buffer {
    seed: u8,
    address: usize,
    size: usize,
}

impl Buffer {
    fn new(index: usize) -> Self { Self { seed: (index * 53) as u8, address: 0, size: 0 } }

    fn resize(&mut self, size: usize) {
        let pointer = unsafe { ZONE_ALLOCATOR.mt_realloc(self.address as *mut u8, size) }.unwrap();

        let preserved = self.size.min(size);

        assert_eq!(Ok(()), unsafe { verify(pointer, preserved, self.seed) });

        unsafe { fill(pointer, size, self.seed) };

        self.address = pointer.as_ptr() as usize;
        self.size = size;
    }

    fn free(self) { unsafe { ZONE_ALLOCATOR.mt_free(self.address as *mut u8) } }
}
