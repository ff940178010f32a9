use vergen_gitcl::{Emitter, Gitcl};

// Git metadata for `version_string()`; falls back to "unknown" outside a checkout.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let gitcl = Gitcl::builder().branch(true).sha(true).dirty(true).build();
    Emitter::default().add_instructions(&gitcl)?.emit()?;
    Ok(())
}
