/// Control-plane operation the termination handler depends on.
pub trait StackDeleter {
    /// Requests deletion of `stack_name`. Deprovisioning continues
    /// asynchronously on the provider side once the request is accepted.
    fn delete_stack(&self, stack_name: &str) -> Result<(), String>;
}
