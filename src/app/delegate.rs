//! NSApplicationDelegate implementation for handling app lifecycle.
//!
//! The delegate owns the menu bar presenter for the lifetime of the process
//! and starts it once AppKit has finished launching.

use std::cell::RefCell;

use objc2::mutability::MainThreadOnly;
use objc2::rc::Retained;
use objc2::{declare_class, msg_send_id, ClassType, DeclaredClass};
use objc2_app_kit::NSApplicationDelegate;
use objc2_foundation::{MainThreadMarker, NSNotification, NSObject, NSObjectProtocol};
use tracing::info;

use crate::overlay::appkit::MenuBarIconPresenter;

// Define the AppDelegate class
declare_class!(
    pub struct AppDelegate;

    unsafe impl ClassType for AppDelegate {
        type Super = NSObject;
        type Mutability = MainThreadOnly;
        const NAME: &'static str = "AppBadgeAppDelegate";
    }

    impl DeclaredClass for AppDelegate {
        type Ivars = RefCell<MenuBarIconPresenter>;
    }

    unsafe impl NSObjectProtocol for AppDelegate {}

    unsafe impl NSApplicationDelegate for AppDelegate {
        #[method(applicationDidFinishLaunching:)]
        fn application_did_finish_launching(&self, _notification: &NSNotification) {
            info!("Application did finish launching");
            self.ivars().borrow_mut().start();
        }

        #[method(applicationWillTerminate:)]
        fn application_will_terminate(&self, _notification: &NSNotification) {
            info!("Application will terminate");
        }
    }
);

impl AppDelegate {
    /// Create a new AppDelegate owning `presenter`.
    pub fn new(mtm: MainThreadMarker, presenter: MenuBarIconPresenter) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(RefCell::new(presenter));
        unsafe { msg_send_id![super(this), init] }
    }
}
