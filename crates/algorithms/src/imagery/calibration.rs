//! Digital number to physical unit conversion

use greenseries_core::Image;

use crate::config::BandGroup;

/// Rescales bands by group: `value * scale + offset`.
///
/// Bands outside every group pass through untouched, as do the image id,
/// acquisition time and CRS. Masked cells are not visited.
#[derive(Debug, Clone)]
pub struct RadiometricCalibrator {
    groups: Vec<BandGroup>,
}

impl RadiometricCalibrator {
    pub fn new(groups: Vec<BandGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[BandGroup] {
        &self.groups
    }

    /// First group whose prefix matches `band`
    pub fn group_for(&self, band: &str) -> Option<&BandGroup> {
        self.groups.iter().find(|g| g.matches(band))
    }

    pub fn apply(&self, image: Image) -> Image {
        image.map_bands(|name, band| match self.group_for(name) {
            Some(group) => {
                let (scale, offset) = (group.scale, group.offset);
                band.map_valid(|dn| dn * scale + offset)
            }
            None => band,
        })
    }
}

impl Default for RadiometricCalibrator {
    fn default() -> Self {
        Self::new(BandGroup::landsat_c2_l2())
    }
}
