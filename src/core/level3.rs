use crate::core::time_sync::{
    classify_groups, flatten_group, interpolate_gps, interpolate_satnav,
    interpolate_to_reference, select_reference,
};
use crate::core::timebase::apply_gps_clock_correction;
use crate::core::wavelength::{attach_ancillary, interpolate_wavelength, match_columns, WavelengthGrid};
use crate::io::tree::Root;
use crate::types::{ColumnTable, InstrumentKind, L3Result, TIMETAG2};
use serde::{Deserialize, Serialize};

/// Parameters of the Level-3 pass. The crate performs no config-file I/O;
/// callers deserialize this from whatever front-end they use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level3Params {
    /// Spacing of the common wavelength grid, in nanometers
    pub wavelength_interval: f64,
    /// Force the reference instrument instead of picking the slowest-sampled
    pub reference_override: Option<InstrumentKind>,
}

impl Default for Level3Params {
    fn default() -> Self {
        Level3Params {
            wavelength_interval: 5.0,
            reference_override: None,
        }
    }
}

fn record_count(table: &ColumnTable) -> usize {
    table.get_float(TIMETAG2).map_or(0, Vec::len)
}

/// Run the full Level-3 pass over one raw sample: GPS clock correction,
/// time synchronization onto the slowest radiometer, wavelength-grid
/// unification and ancillary reattachment.
///
/// The input tree is only touched by the documented GPS clock correction;
/// everything else lands in the returned tree. Any error means no output
/// for this sample and the caller moves on to the next file of its batch.
pub fn process(node: &mut Root, params: &Level3Params) -> L3Result<Root> {
    log::info!("Process Level 3");

    // Instruments without an absolute clock follow GPS UTC (in place).
    // Without a GPS source the native stamps are kept as-is.
    if node.groups().any(|gp| gp.has_dataset("UTCPOS")) {
        apply_gps_clock_correction(node)?;
    } else {
        log::warn!("No UTCPOS source in tree; skipping GPS clock correction");
    }

    let mut root = Root::new();
    root.copy_attributes(node);
    root.attributes.insert("PROCESSING_LEVEL".to_string(), "3".to_string());
    root.attributes.insert("DEPTH_RESOLUTION".to_string(), "N/A".to_string());
    root.attributes.insert(
        "WAVEL_INTERP".to_string(),
        format!("{} nm", params.wavelength_interval),
    );

    // Resolve the raw groups once, then flatten the radiometric trio
    let groups = classify_groups(node)?;
    let es = flatten_group(groups.es, InstrumentKind::Es)?;
    let li = flatten_group(groups.li, InstrumentKind::Li)?;
    let lt = flatten_group(groups.lt, InstrumentKind::Lt)?;

    // Time synchronization onto the slowest-sampled instrument
    let reference_kind = select_reference(
        record_count(&es),
        record_count(&li),
        record_count(&lt),
        params.reference_override,
    );
    let reference = match reference_kind {
        InstrumentKind::Es => es.clone(),
        InstrumentKind::Li => li.clone(),
        InstrumentKind::Lt => lt.clone(),
        other => {
            return Err(crate::types::L3Error::Processing(format!(
                "{} cannot serve as the reference instrument",
                other
            )))
        }
    };

    let sync = |table: &ColumnTable, kind: InstrumentKind| -> L3Result<ColumnTable> {
        if kind == reference_kind {
            // Interpolating the reference to itself is the identity
            return Ok(table.clone());
        }
        interpolate_to_reference(table, &reference, kind)
    };
    let mut es = sync(&es, InstrumentKind::Es)?;
    let mut li = sync(&li, InstrumentKind::Li)?;
    let mut lt = sync(&lt, InstrumentKind::Lt)?;

    let gps = groups
        .gps
        .map(|gp| interpolate_gps(gp, &reference))
        .transpose()?;
    let satnav = groups
        .satnav
        .map(|gp| interpolate_satnav(gp, &reference))
        .transpose()?;

    // Wavelength unification onto the common grid (intersection bounds,
    // so no instrument is ever evaluated outside its native range)
    let grid = WavelengthGrid::common(&[&es, &li, &lt], params.wavelength_interval)?;
    es = interpolate_wavelength(&es, &grid)?;
    li = interpolate_wavelength(&li, &grid)?;
    lt = interpolate_wavelength(&lt, &grid)?;

    attach_ancillary(gps.as_ref(), satnav.as_ref(), &mut [&mut es, &mut li, &mut lt])?;
    match_columns(&mut [&mut es, &mut li, &mut lt]);

    let reference_group = root.add_group("Reference");
    reference_group.add_dataset("ES_hyperspectral").columns = es;
    let sas_group = root.add_group("SAS");
    sas_group.add_dataset("LI_hyperspectral").columns = li;
    sas_group.add_dataset("LT_hyperspectral").columns = lt;
    if let Some(gps) = gps {
        root.push_group(gps);
    }
    if let Some(satnav) = satnav {
        root.push_group(satnav);
    }

    Ok(root)
}
