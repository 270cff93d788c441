use std::ffi::{c_char, c_void};
use std::ptr;

use clap_sys::host::clap_host;
use clap_sys::version::CLAP_VERSION;

struct HostVtable(clap_host);

// The vtable is immutable and its strings are static.
unsafe impl Sync for HostVtable {}

static HOST: HostVtable = HostVtable(clap_host {
    clap_version: CLAP_VERSION,
    host_data: ptr::null_mut(),
    name: b"offhost\0".as_ptr() as *const c_char,
    vendor: b"offhost\0".as_ptr() as *const c_char,
    url: b"\0".as_ptr() as *const c_char,
    version: concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char,
    get_extension: Some(get_extension),
    request_restart: Some(request_restart),
    request_process: Some(request_process),
    request_callback: Some(request_callback),
});

/// The host every instance is created against.
pub(crate) fn host() -> *const clap_host {
    &HOST.0
}

unsafe extern "C" fn get_extension(_host: *const clap_host, id: *const c_char) -> *const c_void {
    log::trace!(
        "plug-in asked for host extension {}",
        crate::discover::c_string(id)
    );
    ptr::null()
}

unsafe extern "C" fn request_restart(_host: *const clap_host) {
    log::debug!("plug-in requested a restart; ignored while rendering offline");
}

unsafe extern "C" fn request_process(_host: *const clap_host) {}

unsafe extern "C" fn request_callback(_host: *const clap_host) {}
