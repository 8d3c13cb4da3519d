use proc_macro::TokenStream;

mod common;
mod methods;

/// Builds the method registry for an actor type from an inherent impl block.
///
/// Every method in the block becomes a [`MethodDescriptor`] in a generated
/// `fn method_table() -> MethodTable<Self>`. Runtime dispatch and timer
/// callback validation both look methods up in that table.
///
/// # Parameters
///
/// - A parameter typed `&mut ActorContext` (or `&ActorContext`) receives the
///   turn context and does not count toward the arity.
/// - A single `Vec<u8>` parameter receives the raw payload.
/// - A single parameter of any other type is decoded from JSON.
/// - Several parameters are decoded from a JSON array, in order.
///
/// Argument types must be owned (`String`, not `&str`).
///
/// # Return Shape
///
/// - `async fn` returning `()`, `ActorResult<()>` or `Result<(), E>`: completion
/// - `async fn` returning anything else: value, serialized as JSON (raw for `Vec<u8>`)
/// - any non-`async` fn: synchronous
///
/// Only completion-shaped methods with at most one parameter can be timer
/// callbacks. Error types must convert into `ActorError`.
///
/// # Attributes
///
/// ```rust,ignore
/// #[actor_methods]
/// impl Sensor {
///     // Registered as "Record"
///     #[roost(rename = "Record")]
///     pub async fn record(&mut self, ctx: &mut ActorContext, data: Vec<u8>) -> ActorResult<()> {
///         ctx.state().set_state("last", &data)?;
///         Ok(())
///     }
///
///     // Not callable by name
///     #[roost(skip)]
///     pub fn new() -> Self {
///         Sensor
///     }
/// }
/// ```
///
/// Two methods renamed to the same name form an overload set; invoking or
/// validating that name fails.
///
/// A second impl block can generate a table under another name with
/// `#[actor_methods(table = "extra_methods")]` and be merged with
/// `MethodTable::extend`.
///
/// [`MethodDescriptor`]: ../roost_api/method/struct.MethodDescriptor.html
#[proc_macro_attribute]
pub fn actor_methods(attr: TokenStream, item: TokenStream) -> TokenStream {
    methods::actor_methods_impl(attr, item)
}
