//! Android soft-keyboard glue.
//!
//! The winit IME surface on Android cannot show or hide the soft keyboard
//! by itself, so the edit bridge's show/hide requests go through JNI to
//! the `InputMethodManager`. Every JNI step can fail while the activity is
//! mid-lifecycle; each failure returns early and the request degrades to a
//! no-op, matching the binding's transient-failure policy.

#[cfg(target_os = "android")]
use jni::objects::{JObject, JValue};
#[cfg(target_os = "android")]
use winit::platform::android::activity::AndroidApp;

/// Asks the input method framework to show the soft keyboard.
#[cfg(target_os = "android")]
pub fn show_soft_input(show_implicit: bool, android_app: &AndroidApp) {
    let jvm = match unsafe { jni::JavaVM::from_raw(android_app.vm_as_ptr().cast()) } {
        Ok(jvm) => jvm,
        Err(_) => return,
    };
    let activity = unsafe { JObject::from_raw(android_app.activity_as_ptr().cast()) };
    let mut env = match jvm.attach_current_thread() {
        Ok(env) => env,
        Err(_) => return,
    };
    if env.exception_check().unwrap_or(true) {
        return;
    }

    let im_manager = match input_method_manager(&mut env, &activity) {
        Some(im_manager) => im_manager,
        None => return,
    };
    let view = match decor_view(&mut env, &activity) {
        Some(view) => view,
        None => return,
    };

    let flags = if show_implicit {
        ndk_sys::ANATIVEACTIVITY_SHOW_SOFT_INPUT_IMPLICIT as i32
    } else {
        0i32
    };
    let _ = env.call_method(
        im_manager,
        "showSoftInput",
        "(Landroid/view/View;I)Z",
        &[JValue::Object(&view), flags.into()],
    );
    // showSoftInput throws while the keyboard is animating open/closed.
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
}

/// Dismisses the soft keyboard.
#[cfg(target_os = "android")]
pub fn hide_soft_input(android_app: &AndroidApp) {
    let jvm = match unsafe { jni::JavaVM::from_raw(android_app.vm_as_ptr().cast()) } {
        Ok(jvm) => jvm,
        Err(_) => return,
    };
    let activity = unsafe { JObject::from_raw(android_app.activity_as_ptr().cast()) };
    let mut env = match jvm.attach_current_thread() {
        Ok(env) => env,
        Err(_) => return,
    };
    if env.exception_check().unwrap_or(true) {
        return;
    }

    let im_manager = match input_method_manager(&mut env, &activity) {
        Some(im_manager) => im_manager,
        None => return,
    };
    let view = match decor_view(&mut env, &activity) {
        Some(view) => view,
        None => return,
    };
    let token = match env
        .call_method(&view, "getWindowToken", "()Landroid/os/IBinder;", &[])
        .and_then(|t| t.l())
    {
        Ok(token) => token,
        Err(_) => return,
    };

    let _ = env.call_method(
        im_manager,
        "hideSoftInputFromWindow",
        "(Landroid/os/IBinder;I)Z",
        &[JValue::Object(&token), 0i32.into()],
    );
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
}

#[cfg(target_os = "android")]
fn input_method_manager<'local>(
    env: &mut jni::JNIEnv<'local>,
    activity: &JObject<'local>,
) -> Option<JObject<'local>> {
    let class_ctxt = env.find_class("android/content/Context").ok()?;
    let ims = env
        .get_static_field(class_ctxt, "INPUT_METHOD_SERVICE", "Ljava/lang/String;")
        .ok()?;
    let im_manager = env
        .call_method(
            activity,
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[(&ims.l().ok()?).into()],
        )
        .and_then(|m| m.l())
        .ok()?;
    if env.exception_check().unwrap_or(true) {
        return None;
    }
    Some(im_manager)
}

#[cfg(target_os = "android")]
fn decor_view<'local>(
    env: &mut jni::JNIEnv<'local>,
    activity: &JObject<'local>,
) -> Option<JObject<'local>> {
    let window = env
        .call_method(activity, "getWindow", "()Landroid/view/Window;", &[])
        .and_then(|w| w.l())
        .ok()?;
    let view = env
        .call_method(&window, "getDecorView", "()Landroid/view/View;", &[])
        .and_then(|v| v.l())
        .ok()?;
    if env.exception_check().unwrap_or(true) {
        return None;
    }
    Some(view)
}
