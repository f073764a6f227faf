/*!

This is the long-form manual for `stratified_sampling` and `stratsample`.

## The register

The input is a row-per-neighborhood population table with three levels of
geographic codes (NUTS1/NUTS2/NUTS3), a province and district name, a
neighborhood identifier, a district status code and a population count.

Status codes:
* `0` metropolitan province center
* `1` central district of a non-metropolitan province
* `2` outer district of a non-metropolitan province

Rows with any other status code are excluded when loading; the engine never
sees them.

## Strata

Every record is assigned to a stratum from its geographic codes, first match
wins:

1. the three metropolitan centers (`TR100`, `TR310`, `TR510`) are their own
   strata;
2. `TR61` and `TRC1` are kept as single-region strata;
3. `TR62`/`TR63` and `TRC2`/`TRC3` are merged into paired strata;
4. the remainders of `TR3` and `TR5` (their metropolitan center excluded)
   form `TR3-dışı` and `TR5-dışı`;
5. everything else falls back to its NUTS1 code.

## Allocation

Interviews are allocated to strata proportionally to population, with
round-half-even per stratum and the whole rounding drift pushed onto the
largest stratum, so the planned interviews always sum to the requested
total. The neighborhood count of a stratum is the interview count divided by
the interviews-per-neighborhood parameter, rounded up, and is then split
between the metropolitan and other classes by population share.

## The two roads

Sampling runs as two independent passes over the register:

* **Road 1 (metropolitan)** draws neighborhoods directly per stratum,
  probability proportional to population, without replacement.
* **Road 2 (other)** first splits the stratum target over the central/outer
  status cells with a largest-remainder rule, picks one district per cell
  (the first district for central cells, a population-weighted draw for
  outer cells), then samples neighborhoods inside that district. Two
  interviews are planned per listed neighborhood on this road.

## Determinism

Every weighted draw reseeds its generator from the configured seed, so a run
is reproducible given the same register, configuration and parameters, and a
cell's selection does not depend on how many cells were drawn before it.
This is what makes a fieldwork plan auditable: re-running the tool over the
archived register reproduces the published sample exactly.

## Configuration

The command line tool reads a JSON plan. A minimal example:

```text
{
    "registerSource": { "filePath": "register.xlsx", "format": "xlsx" },
    "columns": {
        "nuts1": "NUTS1_KODU",
        "nuts2": "NUTS2_KODU",
        "nuts3": "NUTS3_KODU",
        "province": "IL_ADI",
        "district": "ILCE_ADI",
        "neighborhood_code": "MAHALLE_KODU",
        "status": "ILCE_STATU",
        "population": "NUFUS"
    },
    "parameters": { "totalSampleSize": 1000, "interviewsPerNeighborhood": 10 },
    "specialAdjustments": [
        {
            "stratum": "TR61",
            "action": "add_population",
            "conditions": [ { "field": "province", "value": "Antalya" } ]
        }
    ]
}
```

`columns` maps the canonical names to the raw headers of the file; headers
are normalized (trimmed, upper-cased, spaces replaced by underscores) before
the mapping is applied.

*/
