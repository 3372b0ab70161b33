//! Thread naming helpers.

/// Sets the name of the current thread for debuggers and profilers.
///
/// Uses `pthread_setname_np` on unix-family targets and is a no-op
/// elsewhere. Linux truncates names longer than 15 bytes.
pub fn set_thread_name(name: &str) {
    #[cfg(target_family = "unix")]
    {
        use std::ffi::CString;

        let Ok(cname) = CString::new(name) else {
            return;
        };
        unsafe {
            #[cfg(target_vendor = "apple")]
            libc::pthread_setname_np(cname.as_ptr());
            #[cfg(not(target_vendor = "apple"))]
            libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr());
        }
    }
    #[cfg(not(target_family = "unix"))]
    {
        let _ = name;
    }
}
