use std::ptr::{self, NonNull};

use zonealloc::{AllocError, Heap, MappedBreak, HEADER_SIZE};
use zonealloc_test::{fill, is_zeroed, verify};

type MappedHeap = Heap<MappedBreak>;

fn heap() -> MappedHeap { Heap::new(MappedBreak::new(16 * 1024 * 1024).unwrap()) }

fn address(pointer: NonNull<u8>) -> usize { pointer.as_ptr() as usize }

#[test]
fn allocate_aligned() {
    let mut heap = heap();

    for size in 1..=100 {
        let pointer = heap.allocate(size).unwrap();

        assert_eq!(0, address(pointer) % 4, "{}", size);
    }

    assert_eq!(Err(AllocError::AllocationRefused), heap.allocate(0));
}

#[test]
fn allocate_out_of_memory() {
    let mut heap = heap();

    assert_eq!(Err(AllocError::OutOfMemory), heap.allocate(32 * 1024 * 1024));
    assert!(heap.is_empty());
    assert_eq!(0, heap.program_break().offset());
}

#[test]
fn coalesce_reuse() {
    let mut heap = heap();

    let a = heap.allocate(100).unwrap();
    let b = heap.allocate(100).unwrap();
    let _c = heap.allocate(100).unwrap();

    unsafe {
        heap.deallocate(b.as_ptr()).unwrap();
        heap.deallocate(a.as_ptr()).unwrap();
    }

    assert_eq!(a, heap.allocate(200).unwrap());
}

#[test]
fn best_fit() {
    let mut heap = heap();

    let h1 = heap.allocate(200).unwrap();
    let _f1 = heap.allocate(10).unwrap();
    let h2 = heap.allocate(100).unwrap();
    let _f2 = heap.allocate(10).unwrap();

    unsafe {
        heap.deallocate(h1.as_ptr()).unwrap();
        heap.deallocate(h2.as_ptr()).unwrap();
    }

    assert_eq!(h2, heap.allocate(80).unwrap());
}

#[test]
fn split() {
    let mut heap = heap();

    let p = heap.allocate(200).unwrap();
    let _guard = heap.allocate(4).unwrap();

    unsafe { heap.deallocate(p.as_ptr()).unwrap() };

    let first = heap.allocate(50).unwrap();
    let second = heap.allocate(50).unwrap();

    assert_eq!(p, first);
    assert!(address(second) > address(p));
    assert!(address(second) < address(p) + 250);
}

#[test]
fn deallocate_tail_lowers_break() {
    let mut heap = heap();

    let begin = address(heap.program_break().begin());

    let a = heap.allocate(1000).unwrap();
    let b = heap.allocate(5000).unwrap();

    unsafe { heap.deallocate(b.as_ptr()).unwrap() };

    assert_eq!(address(b) - HEADER_SIZE - begin, heap.program_break().offset());

    unsafe { heap.deallocate(a.as_ptr()).unwrap() };

    assert!(heap.is_empty());
    assert_eq!(0, heap.program_break().offset());
}

#[test]
fn deallocate_all_in_reverse() {
    let mut heap = heap();

    let p = heap.allocate(16).unwrap();
    let q = heap.allocate(32).unwrap();

    unsafe {
        heap.deallocate(q.as_ptr()).unwrap();
        heap.deallocate(p.as_ptr()).unwrap();
    }

    assert!(heap.is_empty());
    assert_eq!(0, heap.program_break().offset());

    assert_eq!(p, heap.allocate(16).unwrap());
}

#[test]
fn deallocate_invalid() {
    let mut heap = heap();

    let pointer = heap.allocate(64).unwrap();
    let mut local = 0u32;

    unsafe {
        assert_eq!(Err(AllocError::NullPointer), heap.deallocate(ptr::null_mut()));
        assert_eq!(Err(AllocError::InvalidPointer), heap.deallocate(&mut local as *mut u32 as *mut u8));

        assert_eq!(Ok(()), heap.deallocate(pointer.as_ptr()));
        assert_eq!(Err(AllocError::InvalidPointer), heap.deallocate(pointer.as_ptr()));
    }
}

#[test]
fn allocate_zeroed_large() {
    const SIZE: usize = 100 * 1000;

    let mut heap = heap();

    //  Dirty the memory, then give it back to the OS.
    let dirty = heap.allocate(SIZE).unwrap();
    unsafe {
        ptr::write_bytes(dirty.as_ptr(), 0xEE, SIZE);
        heap.deallocate(dirty.as_ptr()).unwrap();
    }

    //  Dirty the memory, and keep it in the heap.
    let dirty = heap.allocate(SIZE).unwrap();
    let _guard = heap.allocate(4).unwrap();
    unsafe {
        ptr::write_bytes(dirty.as_ptr(), 0xEE, SIZE);
        heap.deallocate(dirty.as_ptr()).unwrap();
    }

    let zeroed = heap.allocate_zeroed(1000, 100).unwrap();

    assert_eq!(dirty, zeroed);
    assert!(unsafe { is_zeroed(zeroed, SIZE) });
}

#[test]
fn reallocate_round_trip() {
    let mut heap = heap();

    unsafe {
        let pointer = heap.reallocate(ptr::null_mut(), 100).unwrap();
        fill(pointer, 100, 1);

        let _guard = heap.allocate(4).unwrap();

        let grown = heap.reallocate(pointer.as_ptr(), 10_000).unwrap();
        assert_ne!(pointer, grown);
        assert_eq!(Ok(()), verify(grown, 100, 1));

        fill(grown, 10_000, 2);

        let shrunk = heap.reallocate(grown.as_ptr(), 200).unwrap();
        assert_eq!(grown, shrunk);
        assert_eq!(Ok(()), verify(shrunk, 200, 2));

        assert_eq!(Err(AllocError::AllocationRefused), heap.reallocate(shrunk.as_ptr(), 0));
        assert_eq!(Err(AllocError::InvalidPointer), heap.deallocate(shrunk.as_ptr()));
    }
}
