use crate::traits::ListenerHandle;
use anyhow::Result;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Mutex, Once};
use std::thread;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HMODULE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::DataExchange::{AddClipboardFormatListener, RemoveClipboardFormatListener};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DispatchMessageW, GetMessageW, PostMessageW, PostQuitMessage,
    RegisterClassW, CS_DBLCLKS, HMENU, MSG, WINDOW_EX_STYLE, WM_CLIPBOARDUPDATE, WM_CLOSE, WM_DESTROY,
    WNDCLASSW, WS_POPUP,
};

static REGISTER_CLASS: Once = Once::new();
static GLOBAL_CALLBACK: Mutex<Option<Box<dyn Fn() + Send + Sync>>> = Mutex::new(None);
static LISTENER_HWND: AtomicIsize = AtomicIsize::new(0);

/// Registers a message-only window for `WM_CLIPBOARDUPDATE`. Only one
/// listener is live per process; a second call replaces the callback.
pub fn start_listener(callback: Box<dyn Fn() + Send + Sync>) -> Result<ListenerHandle> {
    if let Ok(mut guard) = GLOBAL_CALLBACK.lock() {
        *guard = Some(callback);
    }

    thread::Builder::new()
        .name("clipboard-listener".into())
        .spawn(|| unsafe {
            let h_module = GetModuleHandleW(None).unwrap_or(HMODULE(0));
            let h_instance = HINSTANCE(h_module.0);
            let window_class_name = w!("ClipshelfClipboardListener");

            REGISTER_CLASS.call_once(|| {
                let wc = WNDCLASSW {
                    hCursor: Default::default(),
                    hIcon: Default::default(),
                    lpszMenuName: PCWSTR::null(),
                    lpszClassName: window_class_name,
                    lpfnWndProc: Some(wnd_proc),
                    hInstance: h_instance,
                    style: CS_DBLCLKS,
                    ..Default::default()
                };
                let _ = RegisterClassW(&wc);
            });

            // Parent = HWND_MESSAGE
            let hwnd_message = HWND(-3isize);
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                window_class_name,
                w!("ClipboardListener"),
                WS_POPUP,
                0,
                0,
                0,
                0,
                hwnd_message,
                HMENU(0),
                h_instance,
                None,
            );

            if hwnd.0 == 0 {
                tracing::error!("Failed to create clipboard listener window");
                return;
            }
            LISTENER_HWND.store(hwnd.0, Ordering::Release);

            if AddClipboardFormatListener(hwnd).is_err() {
                tracing::error!("AddClipboardFormatListener failed");
            }

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, HWND(0), 0, 0).into() {
                let _ = DispatchMessageW(&msg);
            }

            LISTENER_HWND.store(0, Ordering::Release);
            tracing::debug!("clipboard listener stopped");
        })?;

    Ok(ListenerHandle::new(|| {
        if let Ok(mut guard) = GLOBAL_CALLBACK.lock() {
            *guard = None;
        }
        let raw = LISTENER_HWND.load(Ordering::Acquire);
        if raw != 0 {
            unsafe {
                let _ = PostMessageW(HWND(raw), WM_CLOSE, WPARAM(0), LPARAM(0));
            }
        }
    }))
}

unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_CLIPBOARDUPDATE => {
            if let Ok(guard) = GLOBAL_CALLBACK.lock() {
                if let Some(cb) = &*guard {
                    cb();
                }
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            let _ = RemoveClipboardFormatListener(hwnd);
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
