pub mod books;

use shelf_kernel::{InitCtx, ModuleRegistry};

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &InitCtx<'_>) {
    registry.register(books::create_module(ctx));
}
