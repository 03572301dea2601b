mod affine;
mod aligner;
mod overlay;
#[cfg(test)]
mod tests;

pub use affine::{warp_affine, Affine2, BorderMode};
pub use aligner::{AlignOptions, Correction, FrameAligner};
pub use overlay::{draw_center_marker, draw_face_overlay};
