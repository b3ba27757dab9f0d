use serde::Serialize;

/// Named color treatments applied to the master rendition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualFilter {
    /// Sepia color mix with a vignette
    Vintage,
    /// Brightness and saturation boost
    Bright,
    /// Desaturated with extra contrast
    Noir,
    /// Shifted toward red
    Warm,
    /// Shifted toward blue
    Cool,
    /// Regional look: blue and green shift
    Quebecois,
}

impl VisualFilter {
    pub const ALL: [VisualFilter; 6] = [
        VisualFilter::Vintage,
        VisualFilter::Bright,
        VisualFilter::Noir,
        VisualFilter::Warm,
        VisualFilter::Cool,
        VisualFilter::Quebecois,
    ];

    /// Resolve a requested filter name. `None` means "copy through":
    /// the name was absent, `none`, or not a known filter.
    pub fn from_name(name: Option<&str>) -> Option<Self> {
        let name = name?.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            VisualFilter::Vintage => "vintage",
            VisualFilter::Bright => "bright",
            VisualFilter::Noir => "noir",
            VisualFilter::Warm => "warm",
            VisualFilter::Cool => "cool",
            VisualFilter::Quebecois => "quebecois",
        }
    }

    /// ffmpeg `-vf` filter chain
    pub fn chain(&self) -> &'static str {
        match self {
            VisualFilter::Vintage => {
                "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131,vignette"
            }
            VisualFilter::Bright => "eq=brightness=0.06:saturation=1.5",
            VisualFilter::Noir => "hue=s=0,eq=contrast=1.5",
            VisualFilter::Warm => "colorbalance=rs=.3",
            VisualFilter::Cool => "colorbalance=bs=.3",
            VisualFilter::Quebecois => "colorbalance=bs=.4:gs=.1",
        }
    }
}
