/// Implements `Debug` for a type, listing only the named fields.
///
/// Used for types that hold a handle the back-end doesn't let us print
/// (raw FFI pointers, callback trait objects) alongside fields that are
/// safe to show.
macro_rules! impl_debug {
    ($type:ty, { $($field_name:ident),* $(,)? }) => {
        impl std::fmt::Debug for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut debug_struct = f.debug_struct(stringify!($type));
                $(
                    debug_struct.field(stringify!($field_name), &self.$field_name);
                )*
                debug_struct.finish()
            }
        }
    };
}
