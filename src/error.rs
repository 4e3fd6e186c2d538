use core::fmt::{self, Display, Formatter};

/// Fatal, synchronous engine errors.
///
/// These all indicate caller misuse or an engine bookkeeping bug and are never retried or
/// swallowed. Non-fatal conditions (a dispatched topic without a specific subscriber, a lifecycle
/// hook that fails) are reported through `tracing` instead and do not surface here. Destroying a
/// node that was never mounted is a programming error and panics rather than returning.
#[derive(Debug)]
pub enum Error {
	/// The mount target is not a handle that can host children (e.g. a text node).
	InvalidMountTarget,
	/// `mount` was called on something already mounted. Carries the subject's name.
	AlreadyMounted(&'static str),
	/// `unmount`/`update_state`/`update_props` was called on something not currently mounted.
	NotMounted(&'static str),
	/// A slot node reached the mount engine without having been replaced by content projection.
	UnresolvedSlot,
	/// The surface no longer knows a handle the engine still holds. This signals a bookkeeping
	/// bug in the engine itself, not a usage error.
	SurfaceDesync,
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Error::InvalidMountTarget => f.write_str("mount target is not capable of hosting children"),
			Error::AlreadyMounted(what) => write!(f, "{} is already mounted", what),
			Error::NotMounted(what) => write!(f, "{} is not mounted", what),
			Error::UnresolvedSlot => f.write_str("slot was not resolved by content projection before mounting"),
			Error::SurfaceDesync => f.write_str("render surface no longer knows a handle the engine holds"),
		}
	}
}

impl std::error::Error for Error {}
