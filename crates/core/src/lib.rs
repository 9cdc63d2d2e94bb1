//! Core emulator primitives and traits.

pub mod apu;
pub mod cpu_z80;
pub mod logging;
pub mod types {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }
    }

    /// Palette-indexed framebuffer, one byte per pixel.
    ///
    /// Consoles with a colour RAM publish pixel indices here and keep the
    /// actual colours in a separate, live-updated palette table.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IndexedFrame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
    }

    impl IndexedFrame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        /// Mutable view of one pixel row.
        pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
            let w = self.width as usize;
            &mut self.pixels[y * w..(y + 1) * w]
        }

        /// One pixel row.
        pub fn row(&self, y: usize) -> &[u8] {
            let w = self.width as usize;
            &self.pixels[y * w..(y + 1) * w]
        }

        /// Resolve every index through `palette` into an ARGB frame.
        ///
        /// Indices past the end of the palette resolve to opaque black.
        pub fn to_argb(&self, palette: &[u32]) -> Frame {
            Frame {
                width: self.width,
                height: self.height,
                pixels: self
                    .pixels
                    .iter()
                    .map(|&i| palette.get(i as usize).copied().unwrap_or(0xFF000000))
                    .collect(),
            }
        }
    }

    pub type AudioSample = i16;
}

use serde_json::Value;

/// Description of a mount point (media slot) that a system supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPointInfo {
    /// Unique identifier for this mount point (e.g., "cartridge", "bios")
    pub id: String,
    /// User-friendly name for display (e.g., "Cartridge", "BIOS ROM")
    pub name: String,
    /// File extensions accepted by this mount point (e.g., ["sms", "gg"])
    pub extensions: Vec<String>,
    /// Whether this mount point is required for the system to function
    pub required: bool,
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self);

    /// Emulate until a frame is produced and return a framebuffer.
    fn step_frame(&mut self) -> Result<types::Frame, Self::Error>;

    /// Return a JSON-serializable snapshot for debugging.
    /// Note: snapshots should NOT include ROM/cartridge data.
    fn save_state(&self) -> Value;

    /// Load a JSON save state.
    /// Returns error if the state is incompatible or the system has no save states.
    fn load_state(&mut self, v: &Value) -> Result<(), serde_json::Error>;

    /// Check if this system supports save/load state functionality
    fn supports_save_states(&self) -> bool {
        false
    }

    /// Get the list of mount points this system supports
    fn mount_points(&self) -> Vec<MountPointInfo>;

    /// Load media into a specific mount point
    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Unload media from a specific mount point
    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error>;

    /// Check if a mount point has media loaded
    fn is_mounted(&self, mount_point_id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_initialization() {
        let f = types::Frame::new(10, 10);
        assert_eq!(f.pixels.len(), 100);
        assert_eq!(f.width, 10);
        assert_eq!(f.height, 10);
    }

    #[test]
    fn indexed_frame_rows() {
        let mut f = types::IndexedFrame::new(4, 3);
        f.row_mut(1).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(f.row(0), &[0, 0, 0, 0]);
        assert_eq!(f.row(1), &[1, 2, 3, 4]);
        assert_eq!(&f.pixels[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn indexed_frame_resolves_through_palette() {
        let mut f = types::IndexedFrame::new(2, 1);
        f.pixels[0] = 1;
        f.pixels[1] = 200;
        let argb = f.to_argb(&[0xFF000000, 0xFFFF0000]);
        assert_eq!(argb.width, 2);
        assert_eq!(argb.pixels, vec![0xFFFF0000, 0xFF000000]);
    }

    struct MockSystem;

    impl System for MockSystem {
        type Error = std::convert::Infallible;

        fn reset(&mut self) {}

        fn step_frame(&mut self) -> Result<types::Frame, Self::Error> {
            Ok(types::Frame::new(2, 2))
        }

        fn save_state(&self) -> serde_json::Value {
            serde_json::json!({"mock": true, "version": 1})
        }

        fn load_state(&mut self, _v: &serde_json::Value) -> Result<(), serde_json::Error> {
            Ok(())
        }

        fn mount_points(&self) -> Vec<MountPointInfo> {
            vec![MountPointInfo {
                id: "test".to_string(),
                name: "Test Slot".to_string(),
                extensions: vec!["bin".to_string()],
                required: false,
            }]
        }

        fn mount(&mut self, _mount_point_id: &str, _data: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn unmount(&mut self, _mount_point_id: &str) -> Result<(), Self::Error> {
            Ok(())
        }

        fn is_mounted(&self, _mount_point_id: &str) -> bool {
            false
        }
    }

    #[test]
    fn mock_system_save_load_roundtrip() {
        let sys = MockSystem;
        let v = sys.save_state();
        let s = serde_json::to_string(&v).expect("serialize");
        let v2: serde_json::Value = serde_json::from_str(&s).expect("deserialize");
        let mut sys2 = MockSystem;
        assert!(sys2.load_state(&v2).is_ok());
    }

    #[test]
    fn test_system_mount_points() {
        let sys = MockSystem;
        let mount_points = sys.mount_points();

        assert_eq!(mount_points.len(), 1);
        assert_eq!(mount_points[0].id, "test");
        assert!(!mount_points[0].required);
        assert!(!sys.supports_save_states());
    }
}
