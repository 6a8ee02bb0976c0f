//! Zone Directory
//!
//! The Zone Directory keeps track of all the Zones of a heap, in creation order.
//!
//! The list of Zones is only ever appended to, under the growth lock, hence it can be traversed without locking. A
//! Zone is published, by linking it to the tail, before the count is incremented: a reader observing a given count is
//! guaranteed to be able to reach as many Zones.
//!
//! Allocations are spread across Zones in round-robin fashion, using an atomic cursor.

use core::{
    iter,
    marker::PhantomData,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use crate::{Configuration, Platform};

use super::zone::Zone;

/// ZoneDirectory.
pub(crate) struct ZoneDirectory<C> {
    head: NonNull<Zone>,
    //  Tail of the list, the lock serializes growth.
    tail: Mutex<NonNull<Zone>>,
    count: AtomicUsize,
    cursor: AtomicUsize,
    _configuration: PhantomData<*const C>,
}

impl<C> ZoneDirectory<C>
    where
        C: Configuration,
{
    /// Creates a directory with `C::INITIAL_ZONES` Zones.
    ///
    /// Returns None, after releasing any Zone it created, if any of the Zones cannot be created.
    pub(crate) fn new<P>(platform: &P) -> Option<Self>
        where
            P: Platform,
    {
        let head = Zone::bootstrap::<C, P>(platform)?;

        let mut directory = Self {
            head,
            tail: Mutex::new(head),
            count: AtomicUsize::new(1),
            cursor: AtomicUsize::new(0),
            _configuration: PhantomData,
        };

        for _ in 1..C::INITIAL_ZONES {
            if directory.grow(platform).is_none() {
                //  Safety:
                //  -   The directory was never shared.
                unsafe { directory.close(platform) };
                return None;
            }
        }

        Some(directory)
    }

    /// Returns the number of Zones.
    pub(crate) fn len(&self) -> usize { self.count.load(Ordering::Acquire) }

    /// Returns an iterator over the Zones, in creation order.
    pub(crate) fn zones(&self) -> impl Iterator<Item = &Zone> + '_ {
        //  Safety:
        //  -   Zones live as long as the directory.
        let head = unsafe { &*self.head.as_ptr() };

        //  Safety:
        //  -   Zones live as long as the directory.
        iter::successors(Some(head), |zone| zone.next().map(|next| unsafe { &*next.as_ptr() }))
    }

    /// Selects the Zone to start an allocation from, in round-robin fashion.
    pub(crate) fn select(&self) -> &Zone {
        let count = self.len();
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % count;

        //  Safety:
        //  -   Zones live as long as the directory.
        self.zones().nth(index).unwrap_or_else(|| unsafe { self.head.as_ref() })
    }

    /// Returns the Zone following `zone`, wrapping around to the first Zone after the last.
    pub(crate) fn next_wrapping<'a>(&'a self, zone: &'a Zone) -> &'a Zone {
        let next = zone.next().unwrap_or(self.head);

        //  Safety:
        //  -   Zones live as long as the directory.
        unsafe { &*next.as_ptr() }
    }

    /// Returns the Zone containing `payload`, if any.
    pub(crate) fn find(&self, payload: NonNull<u8>) -> Option<&Zone> { self.zones().find(|zone| zone.contains(payload)) }

    /// Creates a new Zone, appended to the list, returns it.
    ///
    /// Returns None if the Platform cannot provide the region.
    pub(crate) fn grow<P>(&self, platform: &P) -> Option<&Zone>
        where
            P: Platform,
    {
        let mut tail = self.tail.lock();

        let zone = Zone::bootstrap::<C, P>(platform)?;

        //  Safety:
        //  -   Zones live as long as the directory.
        unsafe { tail.as_ref() }.set_next(zone);
        *tail = zone;

        self.count.fetch_add(1, Ordering::Release);

        log::debug!("ZoneDirectory::grow - zone {:?}, count {}", zone, self.len());

        //  Safety:
        //  -   Zones live as long as the directory.
        Some(unsafe { &*zone.as_ptr() })
    }

    /// Releases all the Zones.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `platform` is the one which provided all Zones.
    /// -   Assumes that neither the directory, nor any allocation from its Zones, is used afterwards.
    pub(crate) unsafe fn close<P>(&mut self, platform: &P)
        where
            P: Platform,
    {
        let mut current = Some(self.head);

        while let Some(zone) = current {
            current = zone.as_ref().next();

            Zone::release::<C, P>(zone, platform);
        }

        self.count.store(0, Ordering::Release);
    }
}

//  Safety:
//  -   Zones are only mutated under their own lock, or under the growth lock.
unsafe impl<C> Send for ZoneDirectory<C> {}

//  Safety:
//  -   Zones are only mutated under their own lock, or under the growth lock.
unsafe impl<C> Sync for ZoneDirectory<C> {}

// mod tests
