use std::any::Any;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type BoxAny = Box<dyn Any + Send + Sync>;

// Poison is ignored: every guarded value in this crate is a plain map or
// option that stays structurally valid when another thread panics mid-update.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Last path segment of a type name, with any generic arguments stripped.
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::short_type_name;

    #[test]
    fn strips_path_and_generics() {
        assert_eq!(short_type_name("crate::module::UserService"), "UserService");
        assert_eq!(
            short_type_name("alloc::sync::Arc<dyn app::Reporting>"),
            "Arc"
        );
        assert_eq!(short_type_name("UserService"), "UserService");
    }
}
