//! Partial format ⇄ ADOLC format.

use adsweep::{from_adolc_format, is_canonical, to_adolc_format, to_adolc_format_into, AdError};

#[test]
fn worked_example() {
    assert_eq!(to_adolc_format(&[1, 0, 4], 5).unwrap(), vec![3, 3, 3, 3, 1]);
}

#[test]
fn larger_degree_pads_with_zeros() {
    assert_eq!(
        to_adolc_format(&[1, 0, 4], 7).unwrap(),
        vec![3, 3, 3, 3, 1, 0, 0]
    );
    assert_eq!(to_adolc_format(&[0, 0], 2).unwrap(), vec![0, 0]);
}

#[test]
fn degree_below_total_order_is_rejected() {
    let err = to_adolc_format(&[2, 2], 3).unwrap_err();
    assert!(matches!(err, AdError::InvalidArgument(_)), "{err}");
}

#[test]
fn length_order_and_multiplicity() {
    let partials: [&[usize]; 5] = [&[0, 0, 0], &[3], &[1, 2, 3], &[0, 5, 0, 1], &[2, 0, 0, 2]];
    for p in partials {
        let degree: usize = p.iter().sum();
        let adolc = to_adolc_format(p, degree).unwrap();
        assert_eq!(adolc.len(), degree);
        assert!(is_canonical(&adolc), "{adolc:?}");
        for (var, &order) in p.iter().enumerate() {
            let count = adolc.iter().filter(|&&i| i == var + 1).count();
            assert_eq!(count, order, "variable {} in {p:?}", var + 1);
        }
    }
}

#[test]
fn into_buffer_overwrites_previous_contents() {
    let mut buf = [9; 4];
    to_adolc_format_into(&[0, 1, 1], &mut buf).unwrap();
    assert_eq!(buf, [3, 2, 0, 0]);
}

#[test]
fn from_adolc_inverts_to_adolc() {
    let p = vec![2, 0, 1, 3];
    let adolc = to_adolc_format(&p, 8).unwrap();
    assert_eq!(from_adolc_format(&adolc, 4).unwrap(), p);
}

#[test]
fn from_adolc_rejects_out_of_range_index() {
    assert!(matches!(
        from_adolc_format(&[4, 1], 3),
        Err(AdError::InvalidArgument(_))
    ));
}
