use super::solver_components;
use crate::base::{ModellingHypothesis, Solver};
use crate::StrError;
use nalgebra::DMatrix;
use std::f64::consts::SQRT_2;

/// Holds one entry of the tangent operator conversion
///
/// `DDSDDE[index] = Dt(row, col) * cste^shears`, where `row` and `col` are
/// TFEL components and `shears` counts the shear components among them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConversionEntry {
    /// Position in the solver's column-major array
    pub index: usize,

    /// TFEL row
    pub row: usize,

    /// TFEL column
    pub col: usize,

    /// Number of shear components among (row, col)
    pub shears: i32,
}

/// Returns the scale factor applied once per shear component
///
/// The factor is `√2` for symmetric operators and `1/√2` otherwise.
pub fn tangent_scale_factor(symmetric: bool) -> f64 {
    if symmetric {
        SQRT_2
    } else {
        1.0 / SQRT_2
    }
}

/// Builds the conversion table of the tangent operator
pub fn conversion_table(solver: Solver, h: ModellingHypothesis) -> Result<Vec<ConversionEntry>, StrError> {
    let components = solver_components(solver, h).ok_or("the hypothesis is not supported by the solver")?;
    let n = components.len();
    let mut table = Vec::with_capacity(n * n);
    for (j, col) in components.iter().enumerate() {
        for (i, row) in components.iter().enumerate() {
            table.push(ConversionEntry {
                index: i + n * j,
                row: *row,
                col: *col,
                shears: (*row >= 3) as i32 + (*col >= 3) as i32,
            });
        }
    }
    Ok(table)
}

/// Converts the TFEL tangent operator into the solver's DDSDDE array
pub fn convert_tangent_operator(
    ddsdde: &mut [f64],
    dt: &DMatrix<f64>,
    solver: Solver,
    h: ModellingHypothesis,
    symmetric: bool,
) -> Result<(), StrError> {
    let size = h.stensor_size()?;
    if dt.nrows() != size || dt.ncols() != size {
        return Err("the tangent operator has an invalid size");
    }
    let table = conversion_table(solver, h)?;
    if ddsdde.len() != table.len() {
        return Err("DDSDDE has an invalid size");
    }
    let cste = tangent_scale_factor(symmetric);
    for e in &table {
        ddsdde[e.index] = dt[(e.row, e.col)] * cste.powi(e.shears);
    }
    Ok(())
}

/// Rebuilds the TFEL tangent operator from the solver's DDSDDE array
///
/// Components absent from the solver's storage (`zz` in plane stress) are zero.
pub fn revert_tangent_operator(
    ddsdde: &[f64],
    solver: Solver,
    h: ModellingHypothesis,
    symmetric: bool,
) -> Result<DMatrix<f64>, StrError> {
    let size = h.stensor_size()?;
    let table = conversion_table(solver, h)?;
    if ddsdde.len() != table.len() {
        return Err("DDSDDE has an invalid size");
    }
    let cste = tangent_scale_factor(symmetric);
    let mut dt = DMatrix::<f64>::zeros(size, size);
    for e in &table {
        dt[(e.row, e.col)] = ddsdde[e.index] / cste.powi(e.shears);
    }
    Ok(dt)
}

/// Returns the C++ statements filling DDSDDE from `Dt` (the factor is named `cste`)
pub fn tangent_conversion_lines(solver: Solver, h: ModellingHypothesis) -> Result<Vec<String>, StrError> {
    let table = conversion_table(solver, h)?;
    Ok(table
        .iter()
        .map(|e| {
            let factor = match e.shears {
                0 => "",
                1 => "*cste",
                _ => "*cste*cste",
            };
            format!("DDSDDE[{}] = Dt({},{}){};", e.index, e.row, e.col, factor)
        })
        .collect())
}

/// Converts a strain given by the solver (engineering shear) into TFEL components
pub fn strain_from_solver(values: &[f64], solver: Solver, h: ModellingHypothesis) -> Result<Vec<f64>, StrError> {
    from_solver(values, solver, h, 1.0 / SQRT_2)
}

/// Converts a stress given by the solver into TFEL components
pub fn stress_from_solver(values: &[f64], solver: Solver, h: ModellingHypothesis) -> Result<Vec<f64>, StrError> {
    from_solver(values, solver, h, SQRT_2)
}

/// Converts a TFEL stress into the solver's components
pub fn stress_to_solver(sig: &[f64], solver: Solver, h: ModellingHypothesis) -> Result<Vec<f64>, StrError> {
    let components = solver_components(solver, h).ok_or("the hypothesis is not supported by the solver")?;
    if sig.len() != h.stensor_size()? {
        return Err("the stress has an invalid size");
    }
    Ok(components
        .iter()
        .map(|c| if *c >= 3 { sig[*c] / SQRT_2 } else { sig[*c] })
        .collect())
}

fn from_solver(values: &[f64], solver: Solver, h: ModellingHypothesis, shear: f64) -> Result<Vec<f64>, StrError> {
    let components = solver_components(solver, h).ok_or("the hypothesis is not supported by the solver")?;
    if values.len() != components.len() {
        return Err("the solver's tensor has an invalid size");
    }
    let mut tfel = vec![0.0; h.stensor_size()?];
    for (v, c) in values.iter().zip(components) {
        tfel[*c] = if *c >= 3 { v * shear } else { *v };
    }
    Ok(tfel)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{conversion_table, convert_tangent_operator, revert_tangent_operator, stress_from_solver};
    use super::{strain_from_solver, stress_to_solver, tangent_conversion_lines};
    use crate::base::{ModellingHypothesis, Solver};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use std::f64::consts::SQRT_2;

    #[test]
    fn conversion_table_works() {
        let table = conversion_table(Solver::Ansys, ModellingHypothesis::PlaneStress).unwrap();
        assert_eq!(table.len(), 9);
        assert_eq!((table[2].index, table[2].row, table[2].col, table[2].shears), (2, 3, 0, 1));
        assert_eq!((table[8].row, table[8].col, table[8].shears), (3, 3, 2));
        let table = conversion_table(Solver::LsDyna, ModellingHypothesis::Tridimensional).unwrap();
        assert_eq!(table.len(), 36);
        // solver's yz is TFEL's component 5
        assert_eq!((table[4].row, table[4].col), (5, 0));
        assert_eq!(
            conversion_table(Solver::Ansys, ModellingHypothesis::GeneralisedPlaneStrain).err(),
            Some("the hypothesis is not supported by the solver")
        );
    }

    #[test]
    fn tangent_conversion_lines_work() {
        let lines = tangent_conversion_lines(Solver::Ansys, ModellingHypothesis::PlaneStress).unwrap();
        assert_eq!(lines[0], "DDSDDE[0] = Dt(0,0);");
        assert_eq!(lines[1], "DDSDDE[1] = Dt(1,0);");
        assert_eq!(lines[2], "DDSDDE[2] = Dt(3,0)*cste;");
        assert_eq!(lines[6], "DDSDDE[6] = Dt(0,3)*cste;");
        assert_eq!(lines[8], "DDSDDE[8] = Dt(3,3)*cste*cste;");
    }

    #[test]
    fn convert_tangent_operator_works() {
        let h = ModellingHypothesis::Tridimensional;
        let dt = DMatrix::from_fn(6, 6, |i, j| (1 + i + 10 * j) as f64);
        for symmetric in [true, false] {
            let mut ddsdde = vec![0.0; 36];
            convert_tangent_operator(&mut ddsdde, &dt, Solver::Ansys, h, symmetric).unwrap();
            let cste = if symmetric { SQRT_2 } else { 1.0 / SQRT_2 };
            assert_eq!(ddsdde[0], dt[(0, 0)]);
            assert_relative_eq!(ddsdde[3], dt[(3, 0)] * cste);
            assert_relative_eq!(ddsdde[4 + 6 * 5], dt[(5, 4)] * cste * cste);
            let back = revert_tangent_operator(&ddsdde, Solver::Ansys, h, symmetric).unwrap();
            assert_relative_eq!(back, dt, epsilon = 1e-12);
        }
    }

    #[test]
    fn convert_tangent_operator_captures_errors() {
        let h = ModellingHypothesis::PlaneStrain;
        let mut ddsdde = vec![0.0; 16];
        let dt = DMatrix::<f64>::zeros(3, 3);
        assert_eq!(
            convert_tangent_operator(&mut ddsdde, &dt, Solver::LsDyna, h, true).err(),
            Some("the tangent operator has an invalid size")
        );
        let dt = DMatrix::<f64>::zeros(4, 4);
        let mut ddsdde = vec![0.0; 9];
        assert_eq!(
            convert_tangent_operator(&mut ddsdde, &dt, Solver::LsDyna, h, true).err(),
            Some("DDSDDE has an invalid size")
        );
    }

    #[test]
    fn vector_conversions_work() {
        let h = ModellingHypothesis::PlaneStress;
        let eto = strain_from_solver(&[1.0, 2.0, 3.0], Solver::Ansys, h).unwrap();
        assert_eq!(eto.len(), 4);
        assert_eq!(eto[2], 0.0);
        assert_relative_eq!(eto[3], 3.0 / SQRT_2);
        let sig = stress_from_solver(&[1.0, 2.0, 3.0], Solver::Ansys, h).unwrap();
        assert_relative_eq!(sig[3], 3.0 * SQRT_2);
        let back = stress_to_solver(&sig, Solver::Ansys, h).unwrap();
        assert_relative_eq!(back[2], 3.0, epsilon = 1e-14);
        let h = ModellingHypothesis::Tridimensional;
        let sig = stress_from_solver(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Solver::LsDyna, h).unwrap();
        // solver order: xy, yz, xz
        assert_relative_eq!(sig[4], 6.0 * SQRT_2);
        assert_relative_eq!(sig[5], 5.0 * SQRT_2);
        assert_eq!(
            strain_from_solver(&[1.0], Solver::Ansys, h).err(),
            Some("the solver's tensor has an invalid size")
        );
    }
}
