//! Named shared-memory job table
//!
//! The table is a single POSIX shared-memory object mapped by both the
//! submitter and the scheduler. It holds the scheduling parameters, a
//! process-shared mutex, and a fixed array of [`JobRecord`]s. The
//! submitter creates and eventually unlinks the segment; the scheduler
//! only ever opens an existing one. Every read or write of table contents
//! goes through [`JobTable::with_lock`], which guarantees the mutex is
//! released on every exit path.

use std::mem::size_of;
use std::num::NonZeroUsize;
use std::os::fd::OwnedFd;
use std::ptr::NonNull;

use log::{debug, warn};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc;
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap, shm_open, shm_unlink};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;

use crate::error::TableError;
use crate::record::JobRecord;

/// Maximum number of job records a table can hold
pub const MAX_JOBS: usize = 64;

const TABLE_LEN: usize = size_of::<TableData>();

/// The mapped region. Zeroed at creation; `job_count` grows monotonically
/// as records are appended in submission order.
#[repr(C)]
struct TableData {
    job_count: u32,
    ncpu: u32,
    tslice_ms: u32,
    lock: libc::pthread_mutex_t,
    jobs: [JobRecord; MAX_JOBS],
}

/// Handle over the shared job table.
///
/// Dropping the handle unmaps the region and closes the descriptor; the
/// segment itself lives on until the owner calls [`JobTable::destroy`].
pub struct JobTable {
    name: String,
    data: NonNull<TableData>,
    _fd: OwnedFd,
}

impl JobTable {
    /// Create, size and initialize a new table. Submitter side only.
    pub fn create(name: &str, ncpu: u32, tslice_ms: u32) -> Result<Self, TableError> {
        debug!("JobTable::create: name={name} ncpu={ncpu} tslice_ms={tslice_ms}");
        if ncpu == 0 || tslice_ms == 0 {
            return Err(TableError::BadParams);
        }

        let fd = shm_open(
            name,
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::from_bits_truncate(0o600),
        )
        .map_err(|e| match e {
            Errno::EEXIST => TableError::AlreadyExists(name.to_string()),
            other => TableError::Shm(other),
        })?;

        // ftruncate zero-fills, which is a valid empty table
        ftruncate(&fd, TABLE_LEN as libc::off_t).map_err(TableError::Shm)?;

        let data = map_table(&fd)?;
        let table = Self {
            name: name.to_string(),
            data,
            _fd: fd,
        };

        unsafe {
            let d = table.data.as_ptr();
            (*d).ncpu = ncpu;
            (*d).tslice_ms = tslice_ms;
            init_shared_mutex(std::ptr::addr_of_mut!((*d).lock))?;
        }

        debug!("JobTable::create: created '{name}' ({TABLE_LEN} bytes)");
        Ok(table)
    }

    /// Open an existing table. Scheduler side: never creates, never sizes.
    pub fn open(name: &str) -> Result<Self, TableError> {
        debug!("JobTable::open: name={name}");
        let fd = shm_open(name, OFlag::O_RDWR, Mode::empty()).map_err(|e| match e {
            Errno::ENOENT => TableError::NotFound(name.to_string()),
            other => TableError::Shm(other),
        })?;

        let data = map_table(&fd)?;
        Ok(Self {
            name: name.to_string(),
            data,
            _fd: fd,
        })
    }

    /// Table name, as passed to `shm_open`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scheduling parameters `(ncpu, tslice_ms)`.
    ///
    /// Stamped by `create` before the scheduler attaches and immutable
    /// afterwards, so reading them outside the lock is fine.
    pub fn params(&self) -> (u32, u32) {
        let d = unsafe { self.data.as_ref() };
        (d.ncpu, d.tslice_ms)
    }

    /// Run `f` with exclusive access to the table contents.
    ///
    /// The process-shared mutex is held for the duration of `f` and
    /// released by the guard on every exit path.
    pub fn with_lock<R>(&mut self, f: impl FnOnce(&mut TableView<'_>) -> R) -> Result<R, TableError> {
        let guard = LockGuard::acquire(unsafe { std::ptr::addr_of_mut!((*self.data.as_ptr()).lock) })?;
        let mut view = TableView {
            data: unsafe { self.data.as_mut() },
        };
        let out = f(&mut view);
        drop(guard);
        Ok(out)
    }

    /// Copy of all valid records, taken under the lock.
    pub fn snapshot(&mut self) -> Result<Vec<JobRecord>, TableError> {
        self.with_lock(|view| view.jobs().to_vec())
    }

    /// Final teardown: destroy the mutex, unmap, and unlink the name.
    /// Submitter side only, after the scheduler has drained and exited.
    pub fn destroy(self) -> Result<(), TableError> {
        debug!("JobTable::destroy: name={}", self.name);
        let name = self.name.clone();
        unsafe {
            let rc = libc::pthread_mutex_destroy(std::ptr::addr_of_mut!((*self.data.as_ptr()).lock));
            if rc != 0 {
                // a stuck lock should not leave the segment behind forever
                warn!("JobTable::destroy: pthread_mutex_destroy failed: {}", Errno::from_raw(rc));
            }
        }
        drop(self);
        shm_unlink(name.as_str()).map_err(TableError::Shm)
    }
}

impl Drop for JobTable {
    fn drop(&mut self) {
        if let Err(e) = unsafe { munmap(self.data.cast(), TABLE_LEN) } {
            warn!("JobTable::drop: munmap failed: {e}");
        }
    }
}

impl std::fmt::Debug for JobTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (ncpu, tslice_ms) = self.params();
        f.debug_struct("JobTable")
            .field("name", &self.name)
            .field("ncpu", &ncpu)
            .field("tslice_ms", &tslice_ms)
            .finish()
    }
}

/// Locked view of the table contents, only reachable inside `with_lock`.
pub struct TableView<'a> {
    data: &'a mut TableData,
}

impl TableView<'_> {
    /// Number of valid records
    pub fn job_count(&self) -> usize {
        (self.data.job_count as usize).min(MAX_JOBS)
    }

    /// Total record capacity
    pub fn capacity(&self) -> usize {
        MAX_JOBS
    }

    /// Valid records in submission order
    pub fn jobs(&self) -> &[JobRecord] {
        let n = self.job_count();
        &self.data.jobs[..n]
    }

    /// Valid records in submission order, mutable
    pub fn jobs_mut(&mut self) -> &mut [JobRecord] {
        let n = self.job_count();
        &mut self.data.jobs[..n]
    }

    /// Append a record, returning its stable slot index.
    pub fn push_job(&mut self, record: JobRecord) -> Result<usize, TableError> {
        let slot = self.job_count();
        if slot >= MAX_JOBS {
            return Err(TableError::TableFull(MAX_JOBS));
        }
        self.data.jobs[slot] = record;
        self.data.job_count = (slot + 1) as u32;
        Ok(slot)
    }
}

fn map_table(fd: &OwnedFd) -> Result<NonNull<TableData>, TableError> {
    let len = NonZeroUsize::new(TABLE_LEN).ok_or(TableError::Map(Errno::EINVAL))?;
    let ptr = unsafe {
        mmap(
            None,
            len,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_SHARED,
            fd,
            0,
        )
    }
    .map_err(TableError::Map)?;
    Ok(ptr.cast())
}

/// Initialize the table mutex with `PTHREAD_PROCESS_SHARED` so both the
/// submitter and the scheduler can take it.
unsafe fn init_shared_mutex(lock: *mut libc::pthread_mutex_t) -> Result<(), TableError> {
    let mut attr = std::mem::MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
    let rc = unsafe { libc::pthread_mutexattr_init(attr.as_mut_ptr()) };
    if rc != 0 {
        return Err(TableError::Lock(Errno::from_raw(rc)));
    }
    let attr = attr.as_mut_ptr();

    let rc = unsafe { libc::pthread_mutexattr_setpshared(attr, libc::PTHREAD_PROCESS_SHARED) };
    if rc == 0 {
        let rc = unsafe { libc::pthread_mutex_init(lock, attr) };
        unsafe { libc::pthread_mutexattr_destroy(attr) };
        if rc != 0 {
            return Err(TableError::Lock(Errno::from_raw(rc)));
        }
        Ok(())
    } else {
        unsafe { libc::pthread_mutexattr_destroy(attr) };
        Err(TableError::Lock(Errno::from_raw(rc)))
    }
}

struct LockGuard {
    lock: *mut libc::pthread_mutex_t,
}

impl LockGuard {
    fn acquire(lock: *mut libc::pthread_mutex_t) -> Result<Self, TableError> {
        let rc = unsafe { libc::pthread_mutex_lock(lock) };
        if rc != 0 {
            return Err(TableError::Lock(Errno::from_raw(rc)));
        }
        Ok(Self { lock })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let rc = unsafe { libc::pthread_mutex_unlock(self.lock) };
        if rc != 0 {
            // nothing sane to do here; the next acquisition will fail loudly
            warn!("LockGuard::drop: pthread_mutex_unlock failed: {}", Errno::from_raw(rc));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("/jobtable-test-{tag}-{}-{n}", std::process::id())
    }

    #[test]
    #[serial]
    fn test_create_open_destroy_roundtrip() {
        let name = unique_name("roundtrip");
        let mut owner = JobTable::create(&name, 2, 1000).unwrap();
        assert_eq!(owner.params(), (2, 1000));

        let rec = JobRecord::new(4242, 1, "sleep 1", 100).unwrap();
        let slot = owner.with_lock(|v| v.push_job(rec)).unwrap().unwrap();
        assert_eq!(slot, 0);

        // a second handle over the same name sees the record
        let mut other = JobTable::open(&name).unwrap();
        assert_eq!(other.params(), (2, 1000));
        let snap = other.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].pid, 4242);
        assert_eq!(snap[0].command(), "sleep 1");

        drop(other);
        owner.destroy().unwrap();
        assert!(matches!(JobTable::open(&name), Err(TableError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn test_create_rejects_bad_params() {
        let name = unique_name("params");
        assert!(matches!(JobTable::create(&name, 0, 1000), Err(TableError::BadParams)));
        assert!(matches!(JobTable::create(&name, 2, 0), Err(TableError::BadParams)));
    }

    #[test]
    #[serial]
    fn test_create_twice_fails() {
        let name = unique_name("twice");
        let owner = JobTable::create(&name, 1, 1000).unwrap();
        assert!(matches!(
            JobTable::create(&name, 1, 1000),
            Err(TableError::AlreadyExists(_))
        ));
        owner.destroy().unwrap();
    }

    #[test]
    #[serial]
    fn test_open_missing_table() {
        let name = unique_name("missing");
        assert!(matches!(JobTable::open(&name), Err(TableError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn test_table_full() {
        let name = unique_name("full");
        let mut owner = JobTable::create(&name, 1, 1000).unwrap();
        owner
            .with_lock(|v| {
                for i in 0..MAX_JOBS {
                    let rec = JobRecord::new(i as i32 + 1, 1, "true", 0).unwrap();
                    v.push_job(rec).unwrap();
                }
                assert!(matches!(
                    v.push_job(JobRecord::new(9999, 1, "true", 0).unwrap()),
                    Err(TableError::TableFull(_))
                ));
            })
            .unwrap();
        owner.destroy().unwrap();
    }

    #[test]
    #[serial]
    fn test_mutation_under_lock_is_visible_across_handles() {
        let name = unique_name("mutate");
        let mut owner = JobTable::create(&name, 1, 500).unwrap();
        let mut other = JobTable::open(&name).unwrap();

        owner
            .with_lock(|v| {
                v.push_job(JobRecord::new(7, 2, "true", 0).unwrap()).unwrap();
            })
            .unwrap();

        other
            .with_lock(|v| {
                v.jobs_mut()[0].completed = true;
            })
            .unwrap();

        let snap = owner.snapshot().unwrap();
        assert!(snap[0].completed);

        drop(other);
        owner.destroy().unwrap();
    }
}
