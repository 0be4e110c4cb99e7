/// Static attributes of a bike-share station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub number: i32,
    pub address: String,
    pub banking: bool,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}
